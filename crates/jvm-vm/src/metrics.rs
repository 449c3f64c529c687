use jvm_utils::sync::{AtomicU64, Ordering};
use serde::Serialize;
use std::fmt::{self, Display, Formatter};

#[derive(Debug, Serialize, Clone, Copy, PartialEq)]
pub struct CacheStat {
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
}

impl CacheStat {
    fn new(hits: u64, misses: u64) -> Self {
        let total = hits + misses;
        let hit_rate = if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        };
        Self {
            hits,
            misses,
            hit_rate,
        }
    }
}

impl Display for CacheStat {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hits: {:>8}, misses: {:>8}, hit_rate: {:>6.2}%",
            self.hits,
            self.misses,
            self.hit_rate * 100.0
        )
    }
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq)]
pub struct ResolutionStats {
    pub class_slots: CacheStat,
    pub external_loads: u64,
    pub redundant_slot_writes: u64,
    pub methods_found: u64,
    pub methods_not_found: u64,
    pub field_lookups: u64,
    pub fields_not_found: u64,
    pub for_name_upgrades: u64,
}

impl Display for ResolutionStats {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "Resolution Statistics:")?;
        writeln!(f, "  Class Slots:            {}", self.class_slots)?;
        writeln!(f, "  External Loads:         {:>8}", self.external_loads)?;
        writeln!(
            f,
            "  Redundant Slot Writes:  {:>8}",
            self.redundant_slot_writes
        )?;
        writeln!(
            f,
            "  Methods:                found: {:>8}, not found: {:>8}",
            self.methods_found, self.methods_not_found
        )?;
        writeln!(
            f,
            "  Fields:                 lookups: {:>8}, not found: {:>8}",
            self.field_lookups, self.fields_not_found
        )?;
        writeln!(f, "  forName Upgrades:       {:>8}", self.for_name_upgrades)?;
        Ok(())
    }
}

/// Resolution counters.
///
/// Counters are independent of each other and of the data they describe, so
/// every update is `Ordering::Relaxed`.
#[derive(Debug, Default)]
pub struct ResolutionMetrics {
    pub class_slot_hits: AtomicU64,
    pub class_slot_misses: AtomicU64,
    /// Calls made into the class-loading collaborator. Malformed slots are
    /// counted as misses but never reach it.
    pub external_loads: AtomicU64,
    /// Slot writes that found the slot already resolved by another thread
    pub redundant_slot_writes: AtomicU64,
    pub methods_found: AtomicU64,
    pub methods_not_found: AtomicU64,
    pub field_lookups: AtomicU64,
    pub fields_not_found: AtomicU64,
    pub for_name_upgrades: AtomicU64,
}

impl ResolutionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_class_slot_hit(&self) {
        self.class_slot_hits.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_class_slot_miss(&self) {
        self.class_slot_misses.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_external_load(&self) {
        self.external_loads.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_redundant_slot_write(&self) {
        self.redundant_slot_writes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_method_lookup(&self, found: bool) {
        if found {
            self.methods_found.fetch_add(1, Ordering::Relaxed);
        } else {
            self.methods_not_found.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_field_lookup(&self, found: bool) {
        self.field_lookups.fetch_add(1, Ordering::Relaxed);
        if !found {
            self.fields_not_found.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[inline]
    pub fn record_for_name_upgrade(&self) {
        self.for_name_upgrades.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ResolutionStats {
        ResolutionStats {
            class_slots: CacheStat::new(
                self.class_slot_hits.load(Ordering::Relaxed),
                self.class_slot_misses.load(Ordering::Relaxed),
            ),
            external_loads: self.external_loads.load(Ordering::Relaxed),
            redundant_slot_writes: self.redundant_slot_writes.load(Ordering::Relaxed),
            methods_found: self.methods_found.load(Ordering::Relaxed),
            methods_not_found: self.methods_not_found.load(Ordering::Relaxed),
            field_lookups: self.field_lookups.load(Ordering::Relaxed),
            fields_not_found: self.fields_not_found.load(Ordering::Relaxed),
            for_name_upgrades: self.for_name_upgrades.load(Ordering::Relaxed),
        }
    }
}
