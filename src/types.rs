use gdal::errors::GdalError;
use gdal::raster::GdalDataType;
use std::fmt;
use std::path::PathBuf;

/// Logical role of an input raster within a scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Pan,
    Red,
    Green,
    Blue,
    Nir,
}

impl Role {
    /// All five roles, panchromatic first
    pub const ALL: [Role; 5] = [Role::Pan, Role::Red, Role::Green, Role::Blue, Role::Nir];

    /// The four spectral roles in output band order
    pub const SPECTRAL: [Role; 4] = [Role::Red, Role::Green, Role::Blue, Role::Nir];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Pan => "pan",
            Role::Red => "red",
            Role::Green => "green",
            Role::Blue => "blue",
            Role::Nir => "nir",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pansharpening algorithm producing one output raster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// Fast Intensity Hue Saturation (additive)
    Fihs,
    /// Brovey transform (ratio)
    Brovey,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Fihs => write!(f, "FIHS"),
            Method::Brovey => write!(f, "Brovey"),
        }
    }
}

/// Native pixel storage type of a raster band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelType {
    Byte,
    UInt16,
    Int16,
    UInt32,
    Int32,
    Float32,
    Float64,
}

impl PixelType {
    pub const ALL: [PixelType; 7] = [
        PixelType::Byte,
        PixelType::UInt16,
        PixelType::Int16,
        PixelType::UInt32,
        PixelType::Int32,
        PixelType::Float32,
        PixelType::Float64,
    ];

    /// Map a GDAL band type onto the recognized set, `None` for anything else
    pub fn from_gdal(data_type: GdalDataType) -> Option<Self> {
        match data_type {
            GdalDataType::UInt8 => Some(PixelType::Byte),
            GdalDataType::UInt16 => Some(PixelType::UInt16),
            GdalDataType::Int16 => Some(PixelType::Int16),
            GdalDataType::UInt32 => Some(PixelType::UInt32),
            GdalDataType::Int32 => Some(PixelType::Int32),
            GdalDataType::Float32 => Some(PixelType::Float32),
            GdalDataType::Float64 => Some(PixelType::Float64),
            _ => None,
        }
    }

    pub fn to_gdal(self) -> GdalDataType {
        match self {
            PixelType::Byte => GdalDataType::UInt8,
            PixelType::UInt16 => GdalDataType::UInt16,
            PixelType::Int16 => GdalDataType::Int16,
            PixelType::UInt32 => GdalDataType::UInt32,
            PixelType::Int32 => GdalDataType::Int32,
            PixelType::Float32 => GdalDataType::Float32,
            PixelType::Float64 => GdalDataType::Float64,
        }
    }
}

impl fmt::Display for PixelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PixelType::Byte => "Byte",
            PixelType::UInt16 => "UInt16",
            PixelType::Int16 => "Int16",
            PixelType::UInt32 => "UInt32",
            PixelType::Int32 => "Int32",
            PixelType::Float32 => "Float32",
            PixelType::Float64 => "Float64",
        };
        f.write_str(name)
    }
}

/// Number of bands in each sharpened output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BandCount {
    /// Red, green, blue
    #[default]
    Three,
    /// Red, green, blue, near-infrared
    Four,
}

impl BandCount {
    pub fn get(self) -> usize {
        match self {
            BandCount::Three => 3,
            BandCount::Four => 4,
        }
    }

    /// Spectral roles written to the outputs, in band order
    pub fn roles(self) -> &'static [Role] {
        match self {
            BandCount::Three => &[Role::Red, Role::Green, Role::Blue],
            BandCount::Four => &Role::SPECTRAL,
        }
    }
}

impl TryFrom<u8> for BandCount {
    type Error = PansharpenError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            3 => Ok(BandCount::Three),
            4 => Ok(BandCount::Four),
            other => Err(PansharpenError::Config(format!(
                "number of output bands must be 3 or 4, got {}",
                other
            ))),
        }
    }
}

/// Geospatial transformation parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    pub top_left_x: f64,
    pub pixel_width: f64,
    pub rotation_x: f64,
    pub top_left_y: f64,
    pub rotation_y: f64,
    pub pixel_height: f64,
}

impl Default for GeoTransform {
    /// Identity transform: pixel/line coordinates map onto themselves
    fn default() -> Self {
        Self {
            top_left_x: 0.0,
            pixel_width: 1.0,
            rotation_x: 0.0,
            top_left_y: 0.0,
            rotation_y: 0.0,
            pixel_height: 1.0,
        }
    }
}

impl GeoTransform {
    /// Build from up to six GDAL-ordered coefficients; missing slots keep the identity value
    pub fn from_coefficients(coefficients: &[f64]) -> Self {
        let mut gt = Self::default().to_array();
        for (slot, value) in gt.iter_mut().zip(coefficients) {
            *slot = *value;
        }
        Self::from(gt)
    }

    pub fn to_array(&self) -> [f64; 6] {
        [
            self.top_left_x,
            self.pixel_width,
            self.rotation_x,
            self.top_left_y,
            self.rotation_y,
            self.pixel_height,
        ]
    }
}

impl From<[f64; 6]> for GeoTransform {
    fn from(gt: [f64; 6]) -> Self {
        Self {
            top_left_x: gt[0],
            pixel_width: gt[1],
            rotation_x: gt[2],
            top_left_y: gt[3],
            rotation_y: gt[4],
            pixel_height: gt[5],
        }
    }
}

/// Error types for pansharpening runs
#[derive(Debug, thiserror::Error)]
pub enum PansharpenError {
    #[error("cannot open {role} raster {}: {reason}", .path.display())]
    Open {
        role: Role,
        path: PathBuf,
        reason: String,
    },

    #[error("cannot resample {role} raster onto the panchromatic grid: {message}")]
    Resample { role: Role, message: String },

    #[error("all input rasters must share one pixel type, found {}", describe_types(.found))]
    TypeMismatch { found: Vec<(Role, PixelType)> },

    #[error("{role} raster has unsupported pixel type {type_name}")]
    UnsupportedType { role: Role, type_name: String },

    #[error("failed to read row {row} from {role} raster: {source}")]
    ScanlineRead {
        role: Role,
        row: usize,
        #[source]
        source: GdalError,
    },

    #[error("failed to write row {row} of band {band} to {method} output: {source}")]
    ScanlineWrite {
        method: Method,
        band: usize,
        row: usize,
        #[source]
        source: GdalError,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GDAL error: {0}")]
    Gdal(#[from] GdalError),
}

fn describe_types(found: &[(Role, PixelType)]) -> String {
    found
        .iter()
        .map(|(role, pixel_type)| format!("{}={}", role, pixel_type))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type for pansharpening operations
pub type PansharpenResult<T> = Result<T, PansharpenError>;
