//! User-selection filtering and shortlisting of catalog entries.

use tracing::{debug, warn};

use super::records::{Capacitor, Core, Fet, Heatsink};
use crate::input::Selection;

/// Something a user can pick by name from the catalog.
pub trait CatalogEntry {
    /// Primary identifier.
    fn name(&self) -> &str;

    /// All labels a selection may match (name, material, technology, ...).
    fn labels(&self) -> Vec<&str> {
        vec![self.name()]
    }
}

impl CatalogEntry for Fet {
    fn name(&self) -> &str {
        &self.part_number
    }
}

impl CatalogEntry for Core {
    fn name(&self) -> &str {
        &self.name
    }

    fn labels(&self) -> Vec<&str> {
        vec![self.name.as_str(), self.material.as_str(), self.shape.as_str()]
    }
}

impl CatalogEntry for Capacitor {
    fn name(&self) -> &str {
        &self.part_number
    }

    fn labels(&self) -> Vec<&str> {
        vec![self.part_number.as_str(), self.technology.as_str()]
    }
}

impl CatalogEntry for Heatsink {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Apply a user selection to one catalog kind.
///
/// A select-all flag or an empty name list keeps the whole catalog, and so
/// does a selection that matches nothing: the search space is never emptied
/// by the selection alone.
pub fn filter_selected<'a, T: CatalogEntry>(kind: &str, items: &'a [T], selection: &Selection) -> Vec<&'a T> {
    if selection.is_unrestricted() {
        debug!(kind, count = items.len(), "no selection restriction");
        return items.iter().collect();
    }

    let picked: Vec<&T> = items
        .iter()
        .filter(|item| selection.matches(item.labels()))
        .collect();

    if picked.is_empty() {
        warn!(
            kind,
            requested = ?selection.names,
            "selection matched nothing in the catalog, using the full catalog"
        );
        items.iter().collect()
    } else {
        debug!(kind, count = picked.len(), "selection applied");
        picked
    }
}

/// Best `limit` FETs by figure of merit `R_dson·Q_g`, ties keeping catalog order.
pub fn shortlist_fets(mut fets: Vec<&Fet>, limit: usize) -> Vec<&Fet> {
    fets.sort_by(|a, b| a.figure_of_merit().total_cmp(&b.figure_of_merit()));
    fets.truncate(limit);
    fets
}

/// Smallest `limit` cores by effective volume, ties keeping catalog order.
pub fn shortlist_cores(mut cores: Vec<&Core>, limit: usize) -> Vec<&Core> {
    cores.sort_by(|a, b| a.ve.total_cmp(&b.ve));
    cores.truncate(limit);
    cores
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fets() -> Vec<Fet> {
        vec![
            Fet::new("A", 650.0, 0.10),
            Fet::new("B", 650.0, 0.02),
            Fet::new("C", 100.0, 0.05),
        ]
    }

    #[test]
    fn test_unrestricted_selection_keeps_all() {
        let fets = fets();
        assert_eq!(filter_selected("fet", &fets, &Selection::default()).len(), 3);
        let mut all = Selection::named(["A"]);
        all.select_all = true;
        assert_eq!(filter_selected("fet", &fets, &all).len(), 3);
    }

    #[test]
    fn test_named_selection() {
        let fets = fets();
        let picked = filter_selected("fet", &fets, &Selection::named(["b", "c"]));
        let names: Vec<_> = picked.iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["B", "C"]);
    }

    #[test]
    fn test_empty_intersection_falls_back() {
        let fets = fets();
        let picked = filter_selected("fet", &fets, &Selection::named(["BSC034N10LS5"]));
        assert_eq!(picked.len(), 3);
    }

    #[test]
    fn test_core_selection_by_material() {
        let mut ferrite = Core::new("ETD29", 76e-6, 97e-6, 5.47e-6, 0.053);
        ferrite.material = "Ferrite".to_string();
        let mut powder = Core::new("T130", 0.7e-4, 2e-4, 1e-5, 0.06);
        powder.material = "Powder".to_string();
        let cores = vec![ferrite, powder];
        let picked = filter_selected("core", &cores, &Selection::named(["ferrite"]));
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].name, "ETD29");
    }

    #[test]
    fn test_shortlists() {
        let fets = fets();
        let short = shortlist_fets(fets.iter().collect(), 2);
        let names: Vec<_> = short.iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["B", "C"]);

        let cores = vec![
            Core::new("big", 1e-4, 1e-4, 2e-5, 0.05),
            Core::new("small", 1e-4, 1e-4, 5e-6, 0.05),
        ];
        let short = shortlist_cores(cores.iter().collect(), 1);
        assert_eq!(short[0].name, "small");
    }
}
