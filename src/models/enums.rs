use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid value for {field}: {value}")]
pub struct InvalidEnum {
    pub field: String,
    pub value: String,
}

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($(#[$attr:meta])* $name:ident { $($(#[$vattr:meta])* $variant:ident => $s:literal),+ $(,)? }) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $($(#[$vattr])* $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = InvalidEnum;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

// Device names as they appear in the legacy order payload.
str_enum!(DeviceKind {
    Bipap => "BiPAP",
    Oxygen => "Oxygen Tank",
    Cpap => "CPAP",
    Wheelchair => "Wheelchair",
});

str_enum!(#[derive(Default)] MaskType {
    #[default]
    Unknown => "unknown",
    FullFace => "full face",
    Nasal => "nasal",
    NasalPillow => "nasal pillow",
});

impl MaskType {
    /// Legacy rendering; `Unknown` has no slot in the payload.
    pub fn legacy_label(&self) -> Option<&'static str> {
        match self {
            Self::Unknown => None,
            other => Some(other.as_str()),
        }
    }
}

/// When supplemental oxygen is used. Flags combine: sleep and exertion may
/// both be set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UsageContext(u8);

impl UsageContext {
    pub const NONE: Self = Self(0);
    pub const SLEEP: Self = Self(0b01);
    pub const EXERTION: Self = Self(0b10);
    pub const BOTH: Self = Self(0b11);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    /// Legacy rendering: "sleep and exertion", "sleep", "exertion", or nothing.
    pub fn legacy_label(self) -> Option<&'static str> {
        match (self.contains(Self::SLEEP), self.contains(Self::EXERTION)) {
            (true, true) => Some("sleep and exertion"),
            (true, false) => Some("sleep"),
            (false, true) => Some("exertion"),
            (false, false) => None,
        }
    }
}

impl std::ops::BitOr for UsageContext {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for UsageContext {
    fn bitor_assign(&mut self, rhs: Self) {
        self.insert(rhs);
    }
}
