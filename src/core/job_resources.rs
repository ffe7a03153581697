//! Fixed-dimension resource vectors and their domination algebra.
//!
//! A [`JobResources`] value describes an amount of every resource the scheduler
//! accounts for. Usage vectors are always non-negative; limit vectors may carry
//! the [`INFINITE`] sentinel in any dimension to mean "unconstrained".
//!
//! All arithmetic saturates instead of wrapping, so an infinite limit stays
//! pinned near the sentinel and a runaway subtraction cannot wrap into a huge
//! positive usage.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

/// Sentinel marking a dimension as unconstrained.
pub const INFINITE: i64 = i64::MAX;

/// Exec-node memory distribution: memory limit per node mapped to node count.
pub type MemoryDistribution = BTreeMap<i64, i64>;

/// Named resource dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Number of job slots.
    UserSlots,
    /// CPU, in millicores.
    Cpu,
    /// Number of GPUs.
    Gpu,
    /// Memory, in bytes.
    Memory,
    /// Network weight.
    Network,
}

impl ResourceKind {
    /// Every dimension, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::UserSlots,
        Self::Cpu,
        Self::Gpu,
        Self::Memory,
        Self::Network,
    ];

    /// Snake-case name used in configuration and display.
    pub const fn name(self) -> &'static str {
        match self {
            Self::UserSlots => "user_slots",
            Self::Cpu => "cpu",
            Self::Gpu => "gpu",
            Self::Memory => "memory",
            Self::Network => "network",
        }
    }
}

/// Resource vector over every [`ResourceKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JobResources {
    /// Number of job slots.
    pub user_slots: i64,
    /// CPU, in millicores.
    pub cpu: i64,
    /// Number of GPUs.
    pub gpu: i64,
    /// Memory, in bytes.
    pub memory: i64,
    /// Network weight.
    pub network: i64,
}

impl JobResources {
    /// The all-zero vector.
    pub const fn zero() -> Self {
        Self {
            user_slots: 0,
            cpu: 0,
            gpu: 0,
            memory: 0,
            network: 0,
        }
    }

    /// The vector with every dimension unconstrained.
    pub const fn infinite() -> Self {
        Self {
            user_slots: INFINITE,
            cpu: INFINITE,
            gpu: INFINITE,
            memory: INFINITE,
            network: INFINITE,
        }
    }

    /// Vector with only the user-slot dimension set.
    pub const fn with_user_slots(user_slots: i64) -> Self {
        Self {
            user_slots,
            ..Self::zero()
        }
    }

    /// Read one dimension.
    pub const fn get(&self, kind: ResourceKind) -> i64 {
        match kind {
            ResourceKind::UserSlots => self.user_slots,
            ResourceKind::Cpu => self.cpu,
            ResourceKind::Gpu => self.gpu,
            ResourceKind::Memory => self.memory,
            ResourceKind::Network => self.network,
        }
    }

    /// Overwrite one dimension.
    pub fn set(&mut self, kind: ResourceKind, value: i64) {
        match kind {
            ResourceKind::UserSlots => self.user_slots = value,
            ResourceKind::Cpu => self.cpu = value,
            ResourceKind::Gpu => self.gpu = value,
            ResourceKind::Memory => self.memory = value,
            ResourceKind::Network => self.network = value,
        }
    }

    /// Builder-style [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, kind: ResourceKind, value: i64) -> Self {
        self.set(kind, value);
        self
    }

    fn zip_with(self, other: Self, f: impl Fn(i64, i64) -> i64) -> Self {
        let mut out = Self::zero();
        for kind in ResourceKind::ALL {
            out.set(kind, f(self.get(kind), other.get(kind)));
        }
        out
    }

    fn all_with(self, other: Self, f: impl Fn(i64, i64) -> bool) -> bool {
        ResourceKind::ALL
            .iter()
            .all(|&kind| f(self.get(kind), other.get(kind)))
    }

    /// Componentwise `self >= other`.
    pub fn dominates(&self, other: &Self) -> bool {
        self.all_with(*other, |lhs, rhs| lhs >= rhs)
    }

    /// Componentwise maximum.
    #[must_use]
    pub fn max(self, other: Self) -> Self {
        self.zip_with(other, i64::max)
    }

    /// Componentwise minimum.
    #[must_use]
    pub fn min(self, other: Self) -> Self {
        self.zip_with(other, i64::min)
    }

    /// True when every dimension holds the infinite sentinel.
    pub fn is_infinite(&self) -> bool {
        *self == Self::infinite()
    }
}

/// `Dominates(a, b)`: every dimension of `a` is at least that of `b`.
pub fn dominates(lhs: &JobResources, rhs: &JobResources) -> bool {
    lhs.dominates(rhs)
}

/// Headroom left under `limits` once `usage` is taken and `discount` is given back.
///
/// An infinite limit yields an infinite availability in that dimension no
/// matter how much is in use.
pub fn compute_available_resources(
    limits: &JobResources,
    usage: &JobResources,
    discount: &JobResources,
) -> JobResources {
    let mut available = JobResources::zero();
    for kind in ResourceKind::ALL {
        let limit = limits.get(kind);
        let value = if limit == INFINITE {
            INFINITE
        } else {
            limit
                .saturating_sub(usage.get(kind))
                .saturating_add(discount.get(kind))
        };
        available.set(kind, value);
    }
    available
}

/// Round the memory limit down to whole per-job memory chunks on every node.
///
/// A job that needs `demand.memory / demand.user_slots` bytes can only be
/// packed `memory_per_node / per_job` times into a node, so the leftover on
/// each node is unusable and is dropped from the limit.
pub fn adjusted_resource_limits(
    demand: &JobResources,
    limits: &JobResources,
    memory_distribution: &MemoryDistribution,
) -> JobResources {
    let mut adjusted = *limits;
    if demand.user_slots > 0 && !memory_distribution.is_empty() {
        let memory_per_job = demand.memory / demand.user_slots;
        if memory_per_job > 0 {
            adjusted.memory = memory_distribution
                .iter()
                .map(|(&memory_per_node, &node_count)| {
                    let slots_per_node = memory_per_node / memory_per_job;
                    slots_per_node
                        .saturating_mul(memory_per_job)
                        .saturating_mul(node_count)
                })
                .fold(0_i64, i64::saturating_add);
        }
    }
    adjusted
}

impl Add for JobResources {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        self.zip_with(rhs, i64::saturating_add)
    }
}

impl Sub for JobResources {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        self.zip_with(rhs, i64::saturating_sub)
    }
}

impl AddAssign for JobResources {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl SubAssign for JobResources {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Neg for JobResources {
    type Output = Self;

    fn neg(self) -> Self {
        Self::zero() - self
    }
}

impl fmt::Display for JobResources {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (index, kind) in ResourceKind::ALL.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            match self.get(*kind) {
                INFINITE => write!(f, "{}: inf", kind.name())?,
                value if *kind == ResourceKind::Cpu => write!(f, "{}: {value}m", kind.name())?,
                value => write!(f, "{}: {value}", kind.name())?,
            }
        }
        write!(f, "}}")
    }
}
