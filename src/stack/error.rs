use thiserror::Error;

/// Errors reported by [`Stack`](super::Stack) operations and self-checks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StackError {
    /// Growing the buffer failed.
    #[error("failed to allocate memory for {requested} slots")]
    NoMemory {
        /// Slot count that could not be reserved.
        requested: usize,
    },

    /// Requested capacity was zero.
    #[error("wrong capacity value: zero")]
    CapacityZero,

    /// Requested capacity is above the configured limit.
    #[error("wrong capacity value: {requested} is too big (max {max})")]
    CapacityTooBig {
        /// Capacity that was asked for.
        requested: usize,
        /// Configured upper bound.
        max: usize,
    },

    /// Push needs more room but the stack is already at its limit.
    #[error("stack overflow: capacity {capacity} cannot grow past {max}")]
    CapacityOverflow {
        /// Capacity when the push was attempted.
        capacity: usize,
        /// Configured upper bound.
        max: usize,
    },

    /// Stack name was empty.
    #[error("wrong input stack name")]
    EmptyName,

    /// Operation on a stack that was never constructed.
    #[error("stack is not constructed, operation is impossible")]
    NotConstructed,

    /// Operation on a destroyed stack.
    #[error("stack already destructed")]
    Destructed,

    /// `destroy` called twice.
    #[error("stack destructor repeated")]
    DestructorRepeated,

    /// Pop or peek on an empty stack.
    #[error("stack is empty")]
    Empty,

    /// Index past the live elements.
    #[error("index {index} out of bounds for size {size}")]
    OutOfBounds {
        /// Requested index.
        index: usize,
        /// Number of live elements.
        size: usize,
    },

    /// Stored digest of the control fields no longer matches.
    #[error("stack cracked, control digest corrupted (stored {stored:#018X}, computed {computed:#018X})")]
    ControlDigestMismatch {
        /// Digest recorded after the last legal mutation.
        stored: u64,
        /// Digest of the current control fields.
        computed: u64,
    },

    /// Data buffer is missing.
    #[error("data buffer is missing, data lost")]
    NullData,

    /// Size is not below capacity.
    #[error("size {size} is not below capacity {capacity}")]
    SizeExceedsCapacity {
        /// Logical size.
        size: usize,
        /// Buffer capacity.
        capacity: usize,
    },

    /// Capacity outside `(0, max]`.
    #[error("capacity {capacity} out of bounds (max {max})")]
    CapacityOutOfBounds {
        /// Buffer capacity.
        capacity: usize,
        /// Configured upper bound.
        max: usize,
    },

    /// A slot at or past the size does not hold the sentinel.
    #[error("slot {index} should hold POISON")]
    SentinelViolated {
        /// Offending slot.
        index: usize,
    },

    /// A live slot holds the sentinel.
    #[error("live slot {index} holds POISON")]
    LiveSlotPoisoned {
        /// Offending slot.
        index: usize,
    },

    /// Stored digest of the data buffer no longer matches.
    #[error("stack cracked, data digest corrupted (stored {stored:#018X}, computed {computed:#018X})")]
    DataDigestMismatch {
        /// Digest recorded after the last legal mutation.
        stored: u64,
        /// Digest of the current buffer.
        computed: u64,
    },
}

impl StackError {
    /// Whether this error means the stack's memory is no longer trustworthy
    /// (as opposed to a rejected request).
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            StackError::ControlDigestMismatch { .. }
                | StackError::NullData
                | StackError::SizeExceedsCapacity { .. }
                | StackError::CapacityOutOfBounds { .. }
                | StackError::SentinelViolated { .. }
                | StackError::LiveSlotPoisoned { .. }
                | StackError::DataDigestMismatch { .. }
        )
    }
}
