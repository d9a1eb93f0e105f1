use crate::error::{MemError, MemResult};
use crate::mem::{AddrWidth, DataWidth};
use std::path::PathBuf;

//===========================================================================//

/// The host attribute holding the address width.
pub const ADDR_WIDTH_ATTR: &str = "addrWidth";
/// The host attribute holding the data width.
pub const DATA_WIDTH_ATTR: &str = "dataWidth";
/// The host attribute selecting whether to load an image on startup.
pub const LOAD_ATTR: &str = "LoadImageFromFile";
/// The host attribute holding the image file path.
pub const PATH_ATTR: &str = "Directory";

//===========================================================================//

/// Whether a device should load its image file when it is created.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum LoadMode {
    /// Load the image file named by the device's attributes.
    Load,
    /// Start with blank memory.
    #[default]
    NoLoad,
}

impl LoadMode {
    /// Returns the attribute value that the host uses for this mode.
    pub fn attr_value(self) -> &'static str {
        match self {
            LoadMode::Load => "load",
            LoadMode::NoLoad => "noLoading",
        }
    }

    fn from_attr_value(value: &str) -> Option<LoadMode> {
        match value {
            "load" => Some(LoadMode::Load),
            "noLoading" => Some(LoadMode::NoLoad),
            _ => None,
        }
    }
}

//===========================================================================//

/// The configuration of one memory device instance.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MemAttrs {
    /// The number of address lines.
    pub addr_width: AddrWidth,
    /// The number of data lines.
    pub data_width: DataWidth,
    /// Whether to load `image_path` when the device is created.
    pub load_mode: LoadMode,
    /// The image file associated with the device, if any.
    pub image_path: Option<PathBuf>,
}

impl MemAttrs {
    /// Returns attributes for a blank memory with the given widths.
    pub fn new(addr_bits: u32, data_bits: u32) -> MemResult<MemAttrs> {
        Ok(MemAttrs {
            addr_width: AddrWidth::new(addr_bits)?,
            data_width: DataWidth::new(data_bits)?,
            ..MemAttrs::default()
        })
    }

    /// Returns these attributes, set to load `path` on startup.
    pub fn with_image(mut self, path: impl Into<PathBuf>) -> MemAttrs {
        self.load_mode = LoadMode::Load;
        self.image_path = Some(path.into());
        self
    }

    /// Sets one attribute from the string form the host stores it in.  On
    /// error, the attributes are left unchanged.
    pub fn set_attr(&mut self, name: &str, value: &str) -> MemResult<()> {
        match name {
            ADDR_WIDTH_ATTR => {
                self.addr_width = AddrWidth::new(parse_bits(name, value)?)?;
            }
            DATA_WIDTH_ATTR => {
                self.data_width = DataWidth::new(parse_bits(name, value)?)?;
            }
            LOAD_ATTR => {
                self.load_mode =
                    LoadMode::from_attr_value(value).ok_or_else(|| {
                        MemError::config(
                            LOAD_ATTR,
                            format!("unknown load mode: {value:?}"),
                        )
                    })?;
            }
            PATH_ATTR => {
                self.image_path = if value.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value))
                };
            }
            _ => {
                return Err(MemError::config(
                    "attribute",
                    format!("unknown attribute: {name:?}"),
                ));
            }
        }
        Ok(())
    }

    /// Returns every attribute in the string form the host stores it in.
    pub fn to_attr_values(&self) -> Vec<(&'static str, String)> {
        let path = match &self.image_path {
            Some(path) => path.display().to_string(),
            None => String::new(),
        };
        vec![
            (ADDR_WIDTH_ATTR, self.addr_width.bits().to_string()),
            (DATA_WIDTH_ATTR, self.data_width.bits().to_string()),
            (LOAD_ATTR, self.load_mode.attr_value().to_string()),
            (PATH_ATTR, path),
        ]
    }
}

fn parse_bits(name: &str, value: &str) -> MemResult<u32> {
    value.trim().parse::<u32>().map_err(|_| {
        let attr = if name == ADDR_WIDTH_ATTR {
            ADDR_WIDTH_ATTR
        } else {
            DATA_WIDTH_ATTR
        };
        MemError::config(attr, format!("not a bit count: {value:?}"))
    })
}

//===========================================================================//

#[cfg(test)]
mod tests {
    use super::{LoadMode, MemAttrs};
    use crate::error::MemError;
    use std::path::PathBuf;

    #[test]
    fn defaults() {
        let attrs = MemAttrs::default();
        assert_eq!(attrs.addr_width.bits(), 8);
        assert_eq!(attrs.data_width.bits(), 8);
        assert_eq!(attrs.load_mode, LoadMode::NoLoad);
        assert_eq!(attrs.image_path, None);
    }

    #[test]
    fn set_attrs_from_strings() {
        let mut attrs = MemAttrs::default();
        attrs.set_attr("addrWidth", "16").unwrap();
        attrs.set_attr("dataWidth", "4").unwrap();
        attrs.set_attr("LoadImageFromFile", "load").unwrap();
        attrs.set_attr("Directory", "/tmp/boot.img").unwrap();
        assert_eq!(attrs.addr_width.bits(), 16);
        assert_eq!(attrs.data_width.bits(), 4);
        assert_eq!(attrs.load_mode, LoadMode::Load);
        assert_eq!(attrs.image_path, Some(PathBuf::from("/tmp/boot.img")));
        attrs.set_attr("Directory", "").unwrap();
        assert_eq!(attrs.image_path, None);
    }

    #[test]
    fn invalid_attrs_are_rejected() {
        let mut attrs = MemAttrs::default();
        for (name, value) in [
            ("addrWidth", "25"),
            ("addrWidth", "wide"),
            ("dataWidth", "0"),
            ("LoadImageFromFile", "sometimes"),
            ("color", "red"),
        ] {
            match attrs.set_attr(name, value) {
                Err(MemError::Configuration { .. }) => {}
                other => panic!("{name}={value}: unexpected {other:?}"),
            }
        }
        assert_eq!(attrs, MemAttrs::default());
    }

    #[test]
    fn attr_values_round_trip() {
        let attrs = MemAttrs::new(12, 16).unwrap().with_image("rom.hex");
        let mut copy = MemAttrs::default();
        for (name, value) in attrs.to_attr_values() {
            copy.set_attr(name, &value).unwrap();
        }
        assert_eq!(copy, attrs);
    }
}

//===========================================================================//
