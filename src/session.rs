use crate::data::RegionSummary;

/// Aktualnie wybrany region. Nadpisywany w całości przy każdym wczytaniu.
#[derive(Clone, Debug, PartialEq)]
pub struct RegionSession {
    pub gid: String,
    pub name: String,
    pub summary: RegionSummary,
}
