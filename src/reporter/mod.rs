pub mod json;
pub mod terminal;

use crate::types::RunSummary;

pub trait Reporter {
    fn report(&self, summary: &RunSummary) -> String;
}
