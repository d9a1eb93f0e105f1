use std::fmt;

//===========================================================================//

/// A point in simulated time.
pub type SimTime = u64;

//===========================================================================//

/// The value carried by a tri-state bus.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Signal {
    /// A defined value, with one bit per bus line.
    Value(u32),
    /// Nothing is driving the bus.
    #[default]
    Floating,
    /// The bus is driven, but its value is not (yet) known.
    Unknown,
}

impl Signal {
    /// Returns the value on the bus, if it is defined.
    pub fn value(self) -> Option<u32> {
        match self {
            Signal::Value(value) => Some(value),
            Signal::Floating | Signal::Unknown => None,
        }
    }

    /// Returns true if this is a defined all-zero value.
    pub fn is_low(self) -> bool {
        self == Signal::Value(0)
    }

    /// Returns true if this is a defined, non-zero value.
    pub fn is_high(self) -> bool {
        matches!(self, Signal::Value(value) if value != 0)
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Value(value) => write!(f, "{value:x}"),
            Signal::Floating => f.write_str("Z"),
            Signal::Unknown => f.write_str("X"),
        }
    }
}

//===========================================================================//

/// The ports on a memory device.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Port {
    /// The bidirectional data bus.
    Data,
    /// The address input.
    Addr,
    /// The chip-select input.  When low, the device is disconnected from
    /// the data bus.
    Cs,
    /// The write-enable input.  When high, the data bus is an input and the
    /// cycle is a write.
    Bits,
}

impl Port {
    /// All ports, in the order the host numbers them.
    pub const ALL: [Port; 4] = [Port::Data, Port::Addr, Port::Cs, Port::Bits];
}

//===========================================================================//

/// The values present on a memory device's input ports during one
/// evaluation step.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct BusInputs {
    /// The value on the address port.
    pub addr: Signal,
    /// The value on the data port, as driven by other devices.
    pub data: Signal,
    /// The value on the chip-select port.
    pub cs: Signal,
    /// The value on the write-enable port.
    pub bits: Signal,
}

impl BusInputs {
    /// Returns inputs for a selected read cycle at `addr`.
    pub fn read(addr: u32) -> BusInputs {
        BusInputs {
            addr: Signal::Value(addr),
            data: Signal::Floating,
            cs: Signal::Value(1),
            bits: Signal::Value(0),
        }
    }

    /// Returns inputs for a selected write cycle storing `value` at `addr`.
    pub fn write(addr: u32, value: u32) -> BusInputs {
        BusInputs {
            addr: Signal::Value(addr),
            data: Signal::Value(value),
            cs: Signal::Value(1),
            bits: Signal::Value(1),
        }
    }

    /// Returns a copy of these inputs with chip-select driven low.
    pub fn deselected(self) -> BusInputs {
        BusInputs { cs: Signal::Value(0), ..self }
    }
}

//===========================================================================//

/// An output change that the host simulator should schedule.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BusEvent {
    /// The time at which the output takes the new value.
    pub at: SimTime,
    /// The port being driven.
    pub port: Port,
    /// The new value of the port.
    pub value: Signal,
}

//===========================================================================//


//===========================================================================//
