//! Error type for the audio-path core.

/// Errors reported by the buffer pool and the MIDI batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Every pool slot is held by at least one handle.
    ///
    /// Signals a leaked handle or an undersized pool. [`BufferPool::allocate`]
    /// treats this as fatal; [`BufferPool::try_allocate`] hands it back.
    ///
    /// [`BufferPool::allocate`]: crate::BufferPool::allocate
    /// [`BufferPool::try_allocate`]: crate::BufferPool::try_allocate
    #[error("buffer pool exhausted: all {capacity} slots are in use")]
    PoolExhausted {
        /// Number of slots in the pool.
        capacity: usize,
    },

    /// The MIDI batch reached its fixed capacity.
    #[error("MIDI buffer full: capacity of {capacity} events reached")]
    MidiBufferFull {
        /// Maximum number of events the buffer holds.
        capacity: usize,
    },
}

/// Convenience result type for core operations.
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_exhausted_display() {
        let err = Error::PoolExhausted { capacity: 8 };
        assert_eq!(
            err.to_string(),
            "buffer pool exhausted: all 8 slots are in use"
        );
    }

    #[test]
    fn midi_buffer_full_display() {
        let err = Error::MidiBufferFull { capacity: 4 };
        assert_eq!(
            err.to_string(),
            "MIDI buffer full: capacity of 4 events reached"
        );
    }
}
