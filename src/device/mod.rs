//! Facilities for simulating a RAM or ROM device on a tri-state bus.

use crate::error::{MemError, MemResult};
use crate::image::{self, ImageFormat};
use crate::mem::{AddrWidth, DataWidth, SharedStore};
use std::path::{Path, PathBuf};

mod attrs;
mod signal;

pub use attrs::{
    ADDR_WIDTH_ATTR, DATA_WIDTH_ATTR, LOAD_ATTR, LoadMode, MemAttrs, PATH_ATTR,
};
pub use signal::{BusEvent, BusInputs, Port, Signal, SimTime};

//===========================================================================//

/// The time between a device's inputs settling and its data output becoming
/// valid.
pub const DELAY: SimTime = 10;

//===========================================================================//

/// Which kind of memory a device simulates.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum MemKind {
    /// Read/write memory.
    Ram,
    /// Read-only memory; writes from the bus are ignored.
    Rom,
}

impl MemKind {
    /// Returns true if the bus may write to this kind of memory.
    pub fn accepts_writes(self) -> bool {
        match self {
            MemKind::Ram => true,
            MemKind::Rom => false,
        }
    }

    /// Returns the short human-readable name of this kind of memory.
    pub fn name(self) -> &'static str {
        match self {
            MemKind::Ram => "RAM",
            MemKind::Rom => "ROM",
        }
    }
}

//===========================================================================//

/// A user-triggered operation on a memory device, as offered by the device's
/// context menu.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum MemAction {
    /// Replace the contents of memory with the image at the given path.
    LoadImage(PathBuf),
    /// Write the contents of memory to an image at the given path.
    SaveImage(PathBuf),
    /// Reset every cell to zero.
    ClearContents,
}

//===========================================================================//

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Output {
    Floating,
    Unknown,
    Reading { addr: u32, ready_at: SimTime },
}

/// A simulated memory device: one paged store, the attributes that shape
/// it, and the state of its data output.
pub struct MemDevice {
    kind: MemKind,
    attrs: MemAttrs,
    store: SharedStore,
    current_image: Option<PathBuf>,
    output: Output,
}

impl MemDevice {
    /// Creates a new device.  If the attributes ask for an image to be loaded
    /// on startup, it is loaded now; failure to do so is logged and leaves
    /// the memory blank.
    pub fn new(kind: MemKind, attrs: MemAttrs) -> MemDevice {
        let store = SharedStore::new(attrs.addr_width, attrs.data_width);
        let mut device = MemDevice {
            kind,
            attrs,
            store,
            current_image: None,
            output: Output::Floating,
        };
        device.auto_load();
        device
    }

    /// Creates a new, blank device with the given address and data widths.
    pub fn with_widths(
        kind: MemKind,
        addr_bits: u32,
        data_bits: u32,
    ) -> MemResult<MemDevice> {
        Ok(MemDevice::new(kind, MemAttrs::new(addr_bits, data_bits)?))
    }

    /// Returns which kind of memory this is.
    pub fn kind(&self) -> MemKind {
        self.kind
    }

    /// Returns the device's current attributes.
    pub fn attrs(&self) -> &MemAttrs {
        &self.attrs
    }

    /// Returns the store holding this device's contents.
    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Returns the image file most recently loaded into or saved from this
    /// device, if any.
    pub fn current_image(&self) -> Option<&Path> {
        self.current_image.as_deref()
    }

    /// Returns true if the contents have changed since the last image load
    /// or save.
    pub fn has_unsaved_changes(&self) -> bool {
        self.store.is_dirty()
    }

    /// Returns a human-readable description of this device, e.g. "4kB RAM".
    pub fn description(&self) -> String {
        let size = self.attrs.addr_width.cells();
        let kind = self.kind.name();
        if size < 1024 {
            format!("{size}B {kind}")
        } else if size < 1024 * 1024 {
            format!("{}kB {kind}", size >> 10)
        } else {
            format!("{}MB {kind}", size >> 20)
        }
    }

    /// Returns the number of bits carried by the given port.
    pub fn port_width(&self, port: Port) -> u32 {
        match port {
            Port::Data => self.attrs.data_width.bits(),
            Port::Addr => self.attrs.addr_width.bits(),
            Port::Cs | Port::Bits => 1,
        }
    }

    //=======================================================================//

    /// Evaluates the device for one simulation step at time `now`, returning
    /// the data output change for the host to schedule.
    ///
    /// A write is stored immediately, so a later read of the same address
    /// sees the new value; read data only becomes valid on the bus `DELAY`
    /// time units after the address settles.  For a read, the event is
    /// scheduled for the moment [`MemDevice::data_out`] starts returning the
    /// data (or `now`, if it already does); otherwise at `now + DELAY`.
    pub fn propagate(
        &mut self,
        now: SimTime,
        inputs: &BusInputs,
    ) -> MemResult<BusEvent> {
        let value = self.evaluate(now, inputs)?;
        let at = match self.output {
            Output::Reading { ready_at, .. } => ready_at.max(now),
            Output::Floating | Output::Unknown => now + DELAY,
        };
        Ok(BusEvent { at, port: Port::Data, value })
    }

    fn evaluate(
        &mut self,
        now: SimTime,
        inputs: &BusInputs,
    ) -> MemResult<Signal> {
        if inputs.cs.is_low() {
            self.output = Output::Floating;
            return Ok(Signal::Floating);
        }
        let Some(addr) = inputs.addr.value() else {
            self.output = Output::Unknown;
            return Ok(Signal::Unknown);
        };
        let max_addr = self.attrs.addr_width.max_addr();
        if addr > max_addr {
            self.output = Output::Unknown;
            return Err(MemError::OutOfRange {
                start: addr.into(),
                len: 1,
                limit: self.attrs.addr_width.cells(),
            });
        }
        if inputs.bits.is_high() {
            if self.kind.accepts_writes() {
                self.output = Output::Floating;
                match inputs.data.value() {
                    Some(value) => {
                        self.store.set(addr, value)?;
                    }
                    None => log::debug!(
                        "{}: ignoring write of undefined data at ${addr:x}",
                        self.description()
                    ),
                }
                return Ok(Signal::Floating);
            }
            log::debug!(
                "{}: rejecting write at ${addr:x}",
                self.description()
            );
        }
        let ready_at = match self.output {
            Output::Reading { addr: pending, ready_at } if pending == addr => {
                ready_at
            }
            _ => now + DELAY,
        };
        self.output = Output::Reading { addr, ready_at };
        Ok(Signal::Value(self.store.get(addr)?))
    }

    /// Returns the value that the device is driving onto the data bus at
    /// time `now`.
    pub fn data_out(&self, now: SimTime) -> Signal {
        match self.output {
            Output::Floating => Signal::Floating,
            Output::Unknown => Signal::Unknown,
            Output::Reading { ready_at, .. } if now < ready_at => {
                Signal::Unknown
            }
            Output::Reading { addr, .. } => {
                self.store.get(addr).map_or(Signal::Unknown, Signal::Value)
            }
        }
    }

    //=======================================================================//

    /// Sets one attribute from the string form the host stores it in.
    /// Changing either width discards the current contents.
    pub fn set_attr(&mut self, name: &str, value: &str) -> MemResult<()> {
        let mut attrs = self.attrs.clone();
        attrs.set_attr(name, value)?;
        self.set_attrs(attrs);
        Ok(())
    }

    /// Replaces all of the device's attributes.  Changing either width
    /// discards the current contents, detaching any edit views of the old
    /// contents; the new store is then auto-loaded if the attributes ask for
    /// it.
    pub fn set_attrs(&mut self, attrs: MemAttrs) {
        let widths_changed = attrs.addr_width != self.attrs.addr_width
            || attrs.data_width != self.attrs.data_width;
        let load_changed = attrs.load_mode != self.attrs.load_mode
            || attrs.image_path != self.attrs.image_path;
        self.attrs = attrs;
        if widths_changed {
            self.reset_store(self.attrs.addr_width, self.attrs.data_width);
        }
        if widths_changed || load_changed {
            self.auto_load();
        }
    }

    fn reset_store(&mut self, addr_width: AddrWidth, data_width: DataWidth) {
        log::debug!(
            "{}: reconfigured to {addr_width}, {data_width}; \
             contents discarded",
            self.description()
        );
        self.store.clear();
        self.store = SharedStore::new(addr_width, data_width);
        self.current_image = None;
        self.output = Output::Floating;
    }

    fn auto_load(&mut self) {
        if self.attrs.load_mode != LoadMode::Load {
            return;
        }
        let Some(path) = self.attrs.image_path.clone() else {
            return;
        };
        let format = ImageFormat::from_path(&path);
        match image::load_image(&self.store, &path, format) {
            Ok(()) => self.current_image = Some(absolute_path(&path)),
            Err(error) => log::warn!(
                "{}: could not auto-load image: {error}",
                self.description()
            ),
        }
    }

    //=======================================================================//

    /// Replaces the contents of memory with the image at `path`.  The image
    /// format is chosen from the file extension.  On success, the absolute
    /// path becomes the device's image path attribute.
    pub fn load_image(&mut self, path: &Path) -> MemResult<()> {
        image::load_image(&self.store, path, ImageFormat::from_path(path))?;
        let path = absolute_path(path);
        self.attrs.image_path = Some(path.clone());
        self.current_image = Some(path);
        Ok(())
    }

    /// Writes the contents of memory to an image at `path`.  The image format
    /// is chosen from the file extension.
    pub fn save_image(&mut self, path: &Path) -> MemResult<()> {
        image::save_image(&self.store, path, ImageFormat::from_path(path))?;
        self.current_image = Some(absolute_path(path));
        Ok(())
    }

    /// Resets every cell to zero.
    pub fn clear_contents(&mut self) {
        self.store.clear();
    }

    /// Performs a menu action.
    pub fn perform(&mut self, action: &MemAction) -> MemResult<()> {
        match action {
            MemAction::LoadImage(path) => self.load_image(path),
            MemAction::SaveImage(path) => self.save_image(path),
            MemAction::ClearContents => {
                self.clear_contents();
                Ok(())
            }
        }
    }
}

fn absolute_path(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

//===========================================================================//


//===========================================================================//
