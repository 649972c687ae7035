//! Capability Tags and Sets
//!
//! Defines the closed set of privileges and the per-task bitmap that holds
//! them.
//!
//! # Layout
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  CapabilitySet (u32)                     │
//! ├──────────────────────────────────────────────────────────┤
//! │  bit 0  CHOWN          bit 4  SYS_BOOT                   │
//! │  bit 1  DAC_OVERRIDE   bit 5  SYS_MODULE                 │
//! │  bit 2  KILL           bit 6  SYS_ADMIN                  │
//! │  bit 3  NET_ADMIN      bit 7  SETPCAP                    │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Bit `n` always corresponds to `Capability` discriminant `n`, so a raw
//! capability number is a direct index into the bitmap.

use core::fmt;

use bitflags::bitflags;

/// Number of capabilities in the closed set.
pub const MAX_CAP: usize = 8;

/// A privilege tag gating one class of operation.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[repr(u8)]
pub enum Capability {
    /// Change file ownership.
    Chown = 0,
    /// Bypass discretionary access control.
    DacOverride = 1,
    /// Send signals to tasks of other users.
    Kill = 2,
    /// Administer network configuration.
    NetAdmin = 3,
    /// Reboot or halt the machine.
    SysBoot = 4,
    /// Load and unload kernel modules.
    SysModule = 5,
    /// Administer resource groups.
    SysAdmin = 6,
    /// Modify capability sets, including one's own.
    SetPcap = 7,
}

impl Capability {
    /// Every capability, in discriminant order.
    pub const ALL: [Capability; MAX_CAP] = [
        Capability::Chown,
        Capability::DacOverride,
        Capability::Kill,
        Capability::NetAdmin,
        Capability::SysBoot,
        Capability::SysModule,
        Capability::SysAdmin,
        Capability::SetPcap,
    ];

    /// Convert a raw capability number.
    ///
    /// Returns None for anything outside the declared set.
    #[inline]
    pub const fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(Self::Chown),
            1 => Some(Self::DacOverride),
            2 => Some(Self::Kill),
            3 => Some(Self::NetAdmin),
            4 => Some(Self::SysBoot),
            5 => Some(Self::SysModule),
            6 => Some(Self::SysAdmin),
            7 => Some(Self::SetPcap),
            _ => None,
        }
    }

    /// Get the raw capability number.
    #[inline]
    pub const fn raw(self) -> u32 {
        self as u32
    }

    /// The single-bit set for this capability.
    #[inline]
    pub const fn flag(self) -> CapabilitySet {
        CapabilitySet::from_bits_retain(1 << self as u32)
    }

    /// Conventional name, e.g. `CAP_KILL`.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Chown => "CAP_CHOWN",
            Self::DacOverride => "CAP_DAC_OVERRIDE",
            Self::Kill => "CAP_KILL",
            Self::NetAdmin => "CAP_NET_ADMIN",
            Self::SysBoot => "CAP_SYS_BOOT",
            Self::SysModule => "CAP_SYS_MODULE",
            Self::SysAdmin => "CAP_SYS_ADMIN",
            Self::SetPcap => "CAP_SETPCAP",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

bitflags! {
    /// Fixed-size capability bitmap owned by exactly one task.
    ///
    /// A bit is either granted or not; there is no third state.
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
    pub struct CapabilitySet: u32 {
        /// See [`Capability::Chown`].
        const CHOWN = 1 << 0;
        /// See [`Capability::DacOverride`].
        const DAC_OVERRIDE = 1 << 1;
        /// See [`Capability::Kill`].
        const KILL = 1 << 2;
        /// See [`Capability::NetAdmin`].
        const NET_ADMIN = 1 << 3;
        /// See [`Capability::SysBoot`].
        const SYS_BOOT = 1 << 4;
        /// See [`Capability::SysModule`].
        const SYS_MODULE = 1 << 5;
        /// See [`Capability::SysAdmin`].
        const SYS_ADMIN = 1 << 6;
        /// See [`Capability::SetPcap`].
        const SETPCAP = 1 << 7;
    }
}

impl CapabilitySet {
    /// Check whether `cap` is granted.
    #[inline]
    pub const fn has(&self, cap: Capability) -> bool {
        self.contains(cap.flag())
    }

    /// Check a raw capability number. Fails closed on unknown numbers.
    #[inline]
    pub const fn has_raw(&self, raw: u32) -> bool {
        match Capability::from_raw(raw) {
            Some(cap) => self.has(cap),
            None => false,
        }
    }

    /// Grant or clear exactly one capability.
    #[inline]
    pub fn assign(&mut self, cap: Capability, value: bool) {
        self.set(cap.flag(), value);
    }

    /// Grant or clear a capability by raw number.
    ///
    /// Unknown numbers are ignored rather than treated as a fault.
    pub fn assign_raw(&mut self, raw: u32, value: bool) {
        if let Some(cap) = Capability::from_raw(raw) {
            self.assign(cap, value);
        }
    }

    /// Iterate the granted capabilities in discriminant order.
    pub fn granted(&self) -> impl Iterator<Item = Capability> + '_ {
        Capability::ALL.into_iter().filter(move |cap| self.has(*cap))
    }
}

impl From<Capability> for CapabilitySet {
    fn from(cap: Capability) -> Self {
        cap.flag()
    }
}
