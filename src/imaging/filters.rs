//! Post-processing filter descriptors.
//!
//! These types describe *what* post-processing to apply, not how it is
//! written out. The [`svg`](super::svg) module is the only place that turns
//! them into markup, so adding a filter means adding a [`FilterPrimitive`]
//! variant and wiring it into [`FilterChain::from_selection`].
//!
//! ## Types
//!
//! - [`FilterSelection`]: which effects the caller asked for (greyscale, blur).
//! - [`FilterPrimitive`]: a single SVG filter operation with its fixed constants.
//! - [`FilterInput`]: where a primitive reads from: the source image or an
//!   earlier primitive's named result.
//! - [`FilterChain`]: the ordered, wired list of primitives for one request.

/// `id` of the emitted `<filter>` element, referenced as `url(#effects)`.
pub const FILTER_ID: &str = "effects";

/// Gaussian blur standard deviation, in user units.
pub const BLUR_STD_DEVIATION: f64 = 4.0;

/// Saturation used to approximate greyscale (`feColorMatrix type="saturate"`).
pub const GREYSCALE_SATURATION: f64 = 0.10;

/// Effects requested by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterSelection {
    pub greyscale: bool,
    pub blur: bool,
}

impl FilterSelection {
    /// Parse a comma-separated token list such as `"blur,greyscale"`.
    ///
    /// Tokens are matched exactly after trimming whitespace; unknown tokens
    /// are ignored.
    pub fn parse(tokens: &str) -> Self {
        tokens
            .split(',')
            .map(str::trim)
            .fold(Self::default(), |mut sel, token| {
                match token {
                    "greyscale" => sel.greyscale = true,
                    "blur" => sel.blur = true,
                    _ => {}
                }
                sel
            })
    }

    /// Whether any effect is requested.
    pub fn any(&self) -> bool {
        self.greyscale || self.blur
    }
}

/// A single filter operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterPrimitive {
    /// `feGaussianBlur` with a fixed deviation.
    GaussianBlur { std_deviation: f64 },
    /// `feColorMatrix type="saturate"` with a fixed saturation.
    Saturate { value: f64 },
}

impl FilterPrimitive {
    pub fn blur() -> Self {
        Self::GaussianBlur {
            std_deviation: BLUR_STD_DEVIATION,
        }
    }

    pub fn greyscale() -> Self {
        Self::Saturate {
            value: GREYSCALE_SATURATION,
        }
    }

    /// Name under which this primitive publishes its output.
    pub fn result_name(&self) -> &'static str {
        match self {
            Self::GaussianBlur { .. } => "blurred",
            Self::Saturate { .. } => "desaturated",
        }
    }
}

/// Input of a primitive inside a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterInput {
    SourceGraphic,
    Result(&'static str),
}

impl FilterInput {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SourceGraphic => "SourceGraphic",
            Self::Result(name) => name,
        }
    }
}

/// A primitive together with the input it consumes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterStep {
    pub input: FilterInput,
    pub primitive: FilterPrimitive,
}

/// Ordered list of primitives, each reading the previous one's result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterChain {
    steps: Vec<FilterStep>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the chain for a selection.
    ///
    /// Blur always runs before desaturation, so a combined selection
    /// desaturates the blurred image.
    pub fn from_selection(selection: FilterSelection) -> Self {
        let mut chain = Self::new();
        if selection.blur {
            chain.push(FilterPrimitive::blur());
        }
        if selection.greyscale {
            chain.push(FilterPrimitive::greyscale());
        }
        chain
    }

    /// Append a primitive, wiring its input to the previous step's result.
    pub fn push(&mut self, primitive: FilterPrimitive) {
        let input = match self.steps.last() {
            Some(prev) => FilterInput::Result(prev.primitive.result_name()),
            None => FilterInput::SourceGraphic,
        };
        self.steps.push(FilterStep { input, primitive });
    }

    pub fn steps(&self) -> &[FilterStep] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
