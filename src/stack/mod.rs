//! Self-verifying growable stack
//!
//! Contiguous LIFO buffer with:
//! - a reserved sentinel slot one past the last element (size < capacity)
//! - sentinel (`POISON`) fill of every unused slot
//! - optional digests of the buffer and of the control fields
//!
//! Slots are `Option<T>`; `None` is the sentinel, so no legitimate value
//! can be mistaken for an empty slot. Every mutating operation validates
//! the structure before and after acting and returns a typed
//! [`StackError`] instead of aborting.

mod config;
mod dump;
mod error;

pub use config::{StackConfig, DEFAULT_CAPACITY, MAX_CAPACITY};
pub use error::StackError;

use std::panic::Location;

use crate::registry::{InstanceId, Lifecycle};
use crate::types::Element;

/// Digests recorded after the last legal mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Digests {
    /// Digest of the control fields (name, id, capacity, size, lifecycle)
    pub control: u64,

    /// Digest of every slot, live or sentinel
    pub data: u64,
}

/// Growable stack with structural self-checks
///
/// Invariants of a healthy stack:
/// - `0 < capacity <= max_capacity`
/// - `size < capacity` (slot `size` is reserved and holds the sentinel)
/// - every slot `>= size` holds the sentinel, every slot `< size` a value
/// - stored digests match the current state (when integrity is enabled)
#[derive(Debug, Clone)]
pub struct Stack<T: Element> {
    name: String,
    id: InstanceId,
    slots: Vec<Option<T>>,
    size: usize,
    lifecycle: Lifecycle,
    last_error: Option<StackError>,
    config: StackConfig,
    digests: Option<Digests>,
}

/// Unconstructed placeholder; every operation reports `NotConstructed`
impl<T: Element> Default for Stack<T> {
    fn default() -> Self {
        Self {
            name: String::new(),
            id: InstanceId::default(),
            slots: Vec::new(),
            size: 0,
            lifecycle: Lifecycle::Unconstructed,
            last_error: None,
            config: StackConfig::default(),
            digests: None,
        }
    }
}

impl<T: Element> Stack<T> {
    /// Create stack with default configuration (capacity 8, no digests)
    pub fn new(id: InstanceId, name: impl Into<String>) -> Result<Self, StackError> {
        Self::with_config(id, name, StackConfig::default())
    }

    /// Create stack with explicit initial capacity
    pub fn with_capacity(
        id: InstanceId,
        name: impl Into<String>,
        capacity: usize,
    ) -> Result<Self, StackError> {
        Self::with_config(id, name, StackConfig::default().with_capacity(capacity))
    }

    /// Create stack from a full configuration
    pub fn with_config(
        id: InstanceId,
        name: impl Into<String>,
        config: StackConfig,
    ) -> Result<Self, StackError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(StackError::EmptyName);
        }
        config.validate()?;

        let slots = allocate_slots(config.initial_capacity)?;
        let mut stack = Self {
            name,
            id,
            slots,
            size: 0,
            lifecycle: Lifecycle::Live,
            last_error: None,
            config,
            digests: None,
        };
        stack.reseal();

        tracing::debug!(stack = %stack.name, id = %stack.id, capacity = stack.capacity(), "stack constructed");
        Ok(stack)
    }

    /// Independent copy under a new identity
    ///
    /// `Clone` keeps the source's id and name; use this when the copy is a
    /// separate instance. The source must pass its self-check.
    #[track_caller]
    pub fn duplicate(&self, id: InstanceId, name: impl Into<String>) -> Result<Self, StackError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(StackError::EmptyName);
        }
        self.verify("duplicate")?;

        let mut copy = self.clone();
        copy.id = id;
        copy.name = name;
        copy.last_error = None;
        copy.reseal();

        tracing::debug!(stack = %copy.name, id = %copy.id, source = %self.id, "stack duplicated");
        Ok(copy)
    }

    /// Push a value, doubling the capacity first if only the reserved slot is left
    #[track_caller]
    pub fn push(&mut self, value: T) -> Result<(), StackError> {
        let result = self.push_inner(value);
        self.record(result)
    }

    #[track_caller]
    fn push_inner(&mut self, value: T) -> Result<(), StackError> {
        self.verify("push")?;

        if self.size + 1 >= self.slots.len() {
            self.expand()?;
        }

        self.slots[self.size] = Some(value);
        self.size += 1;
        self.reseal();

        self.verify("push")
    }

    /// Pop the top value
    ///
    /// An empty stack yields [`StackError::Empty`] and is left unchanged.
    #[track_caller]
    pub fn pop(&mut self) -> Result<T, StackError> {
        let result = self.pop_inner();
        self.record(result)
    }

    #[track_caller]
    fn pop_inner(&mut self) -> Result<T, StackError> {
        self.verify("pop")?;

        if self.size == 0 {
            return Err(StackError::Empty);
        }

        let index = self.size - 1;
        let value = self.slots[index]
            .take()
            .ok_or(StackError::LiveSlotPoisoned { index })?;
        self.size = index;
        self.reseal();

        self.verify("pop")?;
        Ok(value)
    }

    /// Top value without removing it
    #[track_caller]
    pub fn peek(&self) -> Result<&T, StackError> {
        self.verify("peek")?;
        match self.size {
            0 => Err(StackError::Empty),
            n => self.live_slot(n - 1),
        }
    }

    /// Bounds-checked access, index 0 is the bottom
    #[track_caller]
    pub fn get(&self, index: usize) -> Result<&T, StackError> {
        self.verify("get")?;
        if index >= self.size {
            return Err(StackError::OutOfBounds {
                index,
                size: self.size,
            });
        }
        self.live_slot(index)
    }

    /// Bounds-checked overwrite of a live element
    #[track_caller]
    pub fn set(&mut self, index: usize, value: T) -> Result<(), StackError> {
        let result = self.set_inner(index, value);
        self.record(result)
    }

    #[track_caller]
    fn set_inner(&mut self, index: usize, value: T) -> Result<(), StackError> {
        self.verify("set")?;
        if index >= self.size {
            return Err(StackError::OutOfBounds {
                index,
                size: self.size,
            });
        }
        self.slots[index] = Some(value);
        self.reseal();
        self.verify("set")
    }

    /// Empty the stack and return to the initial capacity
    #[track_caller]
    pub fn clean(&mut self) -> Result<(), StackError> {
        let result = self.clean_inner();
        self.record(result)
    }

    #[track_caller]
    fn clean_inner(&mut self) -> Result<(), StackError> {
        self.verify("clean")?;
        self.slots = allocate_slots(self.config.initial_capacity)?;
        self.size = 0;
        self.reseal();
        self.verify("clean")
    }

    /// Release the buffer; the stack is unusable afterwards
    ///
    /// A second call reports [`StackError::DestructorRepeated`].
    pub fn destroy(&mut self) -> Result<(), StackError> {
        let result = match self.lifecycle {
            Lifecycle::Unconstructed => Err(StackError::NotConstructed),
            Lifecycle::Destroyed => {
                tracing::warn!(stack = %self.name, id = %self.id, "repeated destroy");
                Err(StackError::DestructorRepeated)
            }
            Lifecycle::Live => {
                self.slots = Vec::new();
                self.size = 0;
                self.digests = None;
                self.lifecycle = Lifecycle::Destroyed;
                tracing::debug!(stack = %self.name, id = %self.id, "stack destroyed");
                Ok(())
            }
        };
        self.record(result)
    }

    /// Number of live elements
    pub fn len(&self) -> usize {
        self.size
    }

    /// Whether no element is stored
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Number of slots, including the reserved one
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the stack
    #[track_caller]
    pub fn set_name(&mut self, name: impl Into<String>) -> Result<(), StackError> {
        let result = self.set_name_inner(name.into());
        self.record(result)
    }

    #[track_caller]
    fn set_name_inner(&mut self, name: String) -> Result<(), StackError> {
        if name.trim().is_empty() {
            return Err(StackError::EmptyName);
        }
        self.verify("set_name")?;
        self.name = name;
        self.reseal();
        self.verify("set_name")
    }

    /// Instance identity
    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// Lifecycle state
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Error of the most recent mutating operation, `None` if it succeeded
    pub fn last_error(&self) -> Option<&StackError> {
        self.last_error.as_ref()
    }

    /// Stored digests (when integrity is enabled)
    pub fn digests(&self) -> Option<Digests> {
        self.digests
    }

    /// Configuration in use
    pub fn config(&self) -> &StackConfig {
        &self.config
    }

    /// Whether slot `index` holds the sentinel
    ///
    /// Slots past the capacity count as sentinel.
    pub fn is_poison_slot(&self, index: usize) -> bool {
        self.slots.get(index).map_or(true, Option::is_none)
    }

    /// Live values, bottom to top
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.slots[..self.size.min(self.slots.len())]
            .iter()
            .filter_map(Option::as_ref)
    }

    /// Copy of the live values, bottom to top
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }

    /// Check every structural invariant, first violation wins
    ///
    /// Priority: construction state, control digest, buffer presence,
    /// size vs capacity, capacity bounds, sentinel slots, data digest.
    pub fn self_check(&self) -> Result<(), StackError> {
        match self.lifecycle {
            Lifecycle::Unconstructed => return Err(StackError::NotConstructed),
            Lifecycle::Destroyed => return Err(StackError::Destructed),
            Lifecycle::Live => {}
        }

        if let Some(algo) = &self.config.integrity {
            let computed = algo.digest(&self.control_bytes());
            let stored = self.digests.map_or(0, |d| d.control);
            if stored != computed {
                return Err(StackError::ControlDigestMismatch { stored, computed });
            }
        }

        let capacity = self.slots.len();
        if capacity == 0 {
            return Err(StackError::NullData);
        }

        if self.size >= capacity {
            return Err(StackError::SizeExceedsCapacity {
                size: self.size,
                capacity,
            });
        }

        if capacity > self.config.max_capacity {
            return Err(StackError::CapacityOutOfBounds {
                capacity,
                max: self.config.max_capacity,
            });
        }

        // Reserved slot first
        if self.slots[self.size].is_some() {
            return Err(StackError::SentinelViolated { index: self.size });
        }
        if let Some(index) = (self.size + 1..capacity).find(|&i| self.slots[i].is_some()) {
            return Err(StackError::SentinelViolated { index });
        }
        if let Some(index) = (0..self.size).find(|&i| self.slots[i].is_none()) {
            return Err(StackError::LiveSlotPoisoned { index });
        }

        if let Some(algo) = &self.config.integrity {
            let computed = algo.digest(&self.data_bytes());
            let stored = self.digests.map_or(0, |d| d.data);
            if stored != computed {
                return Err(StackError::DataDigestMismatch { stored, computed });
            }
        }

        Ok(())
    }

    fn live_slot(&self, index: usize) -> Result<&T, StackError> {
        self.slots[index]
            .as_ref()
            .ok_or(StackError::LiveSlotPoisoned { index })
    }

    /// Double the capacity (clamped to the limit) and poison the new tail
    fn expand(&mut self) -> Result<(), StackError> {
        let old = self.slots.len();
        let new = old.saturating_mul(2).min(self.config.max_capacity);
        if new <= old {
            tracing::warn!(stack = %self.name, id = %self.id, capacity = old, "stack cannot grow further");
            return Err(StackError::CapacityOverflow {
                capacity: old,
                max: self.config.max_capacity,
            });
        }

        self.slots
            .try_reserve_exact(new - old)
            .map_err(|_| StackError::NoMemory { requested: new })?;
        self.slots.resize(new, None);

        tracing::debug!(stack = %self.name, id = %self.id, from = old, to = new, "stack expanded");
        Ok(())
    }

    /// Recompute stored digests after a legal mutation
    fn reseal(&mut self) {
        self.digests = self.config.integrity.as_ref().map(|algo| Digests {
            control: algo.digest(&self.control_bytes()),
            data: algo.digest(&self.data_bytes()),
        });
    }

    fn control_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.name.len() + 32);
        out.extend_from_slice(self.name.as_bytes());
        out.extend_from_slice(&self.id.get().to_le_bytes());
        out.extend_from_slice(&(self.slots.len() as u64).to_le_bytes());
        out.extend_from_slice(&(self.size as u64).to_le_bytes());
        out.push(self.lifecycle.tag());
        out
    }

    fn data_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for slot in &self.slots {
            match slot {
                Some(value) => {
                    out.push(1);
                    value.write_bytes(&mut out);
                }
                None => out.push(0),
            }
        }
        out
    }

    /// Log the failed check together with a full dump
    #[track_caller]
    fn verify(&self, operation: &'static str) -> Result<(), StackError> {
        if let Err(err) = self.self_check() {
            let caller = Location::caller();
            tracing::error!(
                stack = %self.name,
                id = %self.id,
                %caller,
                operation,
                error = %err,
                "stack validation failed\n{}",
                self.dump(operation)
            );
            return Err(err);
        }
        Ok(())
    }

    fn record<R>(&mut self, result: Result<R, StackError>) -> Result<R, StackError> {
        self.last_error = result.as_ref().err().cloned();
        result
    }
}

fn allocate_slots<T: Clone>(capacity: usize) -> Result<Vec<Option<T>>, StackError> {
    let mut slots = Vec::new();
    slots
        .try_reserve_exact(capacity)
        .map_err(|_| StackError::NoMemory {
            requested: capacity,
        })?;
    slots.resize(capacity, None);
    Ok(slots)
}
