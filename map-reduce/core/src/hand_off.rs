// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::error::HandOffError;

/// Seam where a network transport between distributed roles would attach
///
/// No wire format is defined; the only implementation shipped is
/// [`NoopHandOff`].
pub trait HandOff<K, V>: Send {
    /// Called by a distributed worker after its local reduce completes
    fn send_to_main(&self, results: &[(K, V)]) -> Result<(), HandOffError>;

    /// Gathers results produced by remote workers
    fn receive_from_workers(&self) -> Result<Vec<(K, V)>, HandOffError>;
}

/// Hand-off that sends nothing and receives nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHandOff;

impl<K, V> HandOff<K, V> for NoopHandOff {
    fn send_to_main(&self, _results: &[(K, V)]) -> Result<(), HandOffError> {
        Ok(())
    }

    fn receive_from_workers(&self) -> Result<Vec<(K, V)>, HandOffError> {
        Ok(Vec::new())
    }
}
