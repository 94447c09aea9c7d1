use crate::ConfigError;

/// How item sizes along the scroll axis are determined.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Sizing {
    /// Every item has exactly this size. Measurements are ignored.
    Fixed(u32),
    /// Items start at this estimate and are corrected by measurements.
    Estimated(u32),
}

impl Sizing {
    /// The size used for an item without a measurement.
    pub fn default_size(self) -> u32 {
        match self {
            Self::Fixed(size) | Self::Estimated(size) => size,
        }
    }

    pub fn is_variable(self) -> bool {
        matches!(self, Self::Estimated(_))
    }
}

/// The virtualized axis.
///
/// Host-facing metadata: geometry is axis-agnostic (one offset and one size per item), so the
/// range math never reads it. Adapters use it to map offsets onto `top`/`left`, scroll
/// positions and measured heights or widths.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Axis {
    #[default]
    Vertical,
    Horizontal,
}

/// Configuration for a virtualized list.
///
/// Built with [`ListConfig::fixed`] or [`ListConfig::estimated`] and the `with_*` helpers, then
/// checked with [`ListConfig::validate`] before use.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ListConfig {
    pub item_count: usize,
    pub sizing: Sizing,
    /// Extra items rendered on each side of the viewport.
    pub overscan: usize,
    /// Read by adapters only; see [`Axis`].
    pub axis: Axis,
}

impl ListConfig {
    /// Uniform mode: every item is `item_size` long.
    pub fn fixed(item_count: usize, item_size: u32) -> Self {
        Self {
            item_count,
            sizing: Sizing::Fixed(item_size),
            overscan: 1,
            axis: Axis::Vertical,
        }
    }

    /// Variable mode: items are assumed to be `estimate` long until measured.
    pub fn estimated(item_count: usize, estimate: u32) -> Self {
        Self {
            item_count,
            sizing: Sizing::Estimated(estimate),
            overscan: 1,
            axis: Axis::Vertical,
        }
    }

    pub fn with_item_count(mut self, item_count: usize) -> Self {
        self.item_count = item_count;
        self
    }

    pub fn with_sizing(mut self, sizing: Sizing) -> Self {
        self.sizing = sizing;
        self
    }

    pub fn with_overscan(mut self, overscan: usize) -> Self {
        self.overscan = overscan;
        self
    }

    pub fn with_axis(mut self, axis: Axis) -> Self {
        self.axis = axis;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sizing.default_size() == 0 {
            return Err(ConfigError::ZeroItemSize);
        }
        Ok(())
    }
}

/// Untyped configuration as supplied by a host that only deals in floating point numbers.
///
/// Converting it into a [`ListConfig`] is the configuration boundary: negative, fractional or
/// non-finite values are rejected there and never reach the range math.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawListConfig {
    pub item_count: f64,
    pub item_size: f64,
    pub variable: bool,
    pub overscan: f64,
    /// Read by adapters only; see [`Axis`].
    #[cfg_attr(feature = "serde", serde(default))]
    pub axis: Axis,
}

impl TryFrom<RawListConfig> for ListConfig {
    type Error = ConfigError;

    fn try_from(raw: RawListConfig) -> Result<Self, Self::Error> {
        let item_count = whole_number(raw.item_count)
            .ok_or(ConfigError::InvalidItemCount(raw.item_count))?;
        let overscan =
            whole_number(raw.overscan).ok_or(ConfigError::InvalidOverscan(raw.overscan))?;
        let item_size = whole_number(raw.item_size)
            .filter(|&s| s <= u32::MAX as usize)
            .ok_or(ConfigError::InvalidItemSize(raw.item_size))? as u32;

        let sizing = if raw.variable {
            Sizing::Estimated(item_size)
        } else {
            Sizing::Fixed(item_size)
        };
        let config = ListConfig {
            item_count,
            sizing,
            overscan,
            axis: raw.axis,
        };
        config.validate()?;
        vtrace!(item_count, overscan, "ListConfig::try_from(RawListConfig)");
        Ok(config)
    }
}

/// Returns `value` as `usize` if it is a finite, non-negative integer in range.
fn whole_number(value: f64) -> Option<usize> {
    if !value.is_finite() || value < 0.0 || value >= usize::MAX as f64 {
        return None;
    }
    let whole = value as usize;
    (whole as f64 == value).then_some(whole)
}
