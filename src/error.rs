//! Error types returned by the scan engine and its collaborators

use core::fmt;

/// Pin multiplexer failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinError {
    /// The port/pin pair does not exist on this package
    InvalidPort { port: u8, pin: u8 },
    /// The pin is reserved for another function (e.g. TSCAP)
    Reserved,
}

/// Event link (interrupt routing) failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EventLinkError {
    /// Every event link slot is already in use
    NoFreeSlot,
}

/// Channel configuration failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// The pin has no hardware touch channel
    UnsupportedPin(u8),
    /// The pin is already registered; nothing was changed
    AlreadyConfigured { slot: usize },
    /// Every channel slot is in use
    CapacityExceeded,
    /// The pin has not been configured for touch
    NotConfigured(u8),
    /// A setting is outside its register range
    InvalidSetting,
    /// The pin multiplexer refused the pin
    Pin(PinError),
    /// Scan events could not be routed
    EventLink(EventLinkError),
    /// No engine has been installed in the shared slot yet
    NoEngine,
}

impl From<PinError> for ConfigError {
    fn from(e: PinError) -> Self {
        ConfigError::Pin(e)
    }
}

impl From<EventLinkError> for ConfigError {
    fn from(e: EventLinkError) -> Self {
        ConfigError::EventLink(e)
    }
}

impl fmt::Display for PinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinError::InvalidPort { port, pin } => write!(f, "P{}{:02} does not exist", port, pin),
            PinError::Reserved => f.write_str("pin is reserved"),
        }
    }
}

impl fmt::Display for EventLinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventLinkError::NoFreeSlot => f.write_str("no free event link slot"),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::UnsupportedPin(pin) => write!(f, "pin {} is not a touch pin", pin),
            ConfigError::AlreadyConfigured { slot } => {
                write!(f, "pin already configured in slot {}", slot)
            }
            ConfigError::CapacityExceeded => f.write_str("all touch channel slots are in use"),
            ConfigError::NotConfigured(pin) => write!(f, "pin {} is not configured", pin),
            ConfigError::InvalidSetting => f.write_str("channel setting out of range"),
            ConfigError::Pin(e) => write!(f, "pin mux: {}", e),
            ConfigError::EventLink(e) => write!(f, "event link: {}", e),
            ConfigError::NoEngine => f.write_str("no touch engine installed"),
        }
    }
}

impl core::error::Error for PinError {}
impl core::error::Error for EventLinkError {}
impl core::error::Error for ConfigError {}
