//! Present Module - Render-ready prediction output
//!
//! The headline price never depends on the explanation: a missing or failed
//! attribution only removes the waterfall.

pub mod render;
pub mod waterfall;

use serde::{Deserialize, Serialize};

use crate::logic::explain::AttributionResult;

pub use render::{format_price, render_page, render_text, PageContext};
pub use waterfall::{Waterfall, WaterfallStep, DEFAULT_TOP_N, MAX_TOP_N, MIN_TOP_N};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Presentation {
    pub prediction: f64,
    pub headline: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waterfall: Option<Waterfall>,
    /// Why the waterfall is missing, when it was requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

impl Presentation {
    pub fn new(prediction: f64) -> Self {
        Self {
            prediction,
            headline: format_price(prediction),
            waterfall: None,
            notice: None,
        }
    }

    pub fn with_attribution(mut self, attribution: &AttributionResult, top_n: usize) -> Self {
        self.waterfall = Some(Waterfall::build(attribution, top_n));
        self
    }

    pub fn with_notice(mut self, notice: impl Into<String>) -> Self {
        self.notice = Some(notice.into());
        self
    }
}
