use crate::error::{Result, SelectionError};
use crate::selection::{CombineMode, GeometrySelection, SelectionId, TopologyType};

/// Combines `b` into `a`.
///
/// Triangle selections use plain set algebra on ids. Polygroup selections match
/// elements by topology id, so entries naming the same group (or corner, or
/// group edge) through different seeds are treated as equal, and `a` keeps its
/// own seeds.
pub fn combine_selection_in_place(a: &mut GeometrySelection, b: &GeometrySelection, mode: CombineMode) -> Result<()> {
    if !a.is_same_type(b) {
        return Err(SelectionError::IncompatibleSelections);
    }
    match (a.topology_type, mode) {
        (TopologyType::Triangle, CombineMode::Add) => a.extend(b.iter()),
        (TopologyType::Triangle, CombineMode::Subtract) => {
            for id in b.iter() {
                a.remove(id);
            }
        }
        (TopologyType::Triangle, CombineMode::Intersection) => {
            let drop: Vec<SelectionId> = a.iter().filter(|&id| !b.contains_exact(id)).collect();
            for id in drop {
                a.remove(id);
            }
        }
        (TopologyType::Polygroup, CombineMode::Add) => {
            for id in b.iter() {
                if a.find_by_topology_id(id.topology()).is_none() {
                    a.insert(id);
                }
            }
        }
        (TopologyType::Polygroup, CombineMode::Subtract) => {
            for id in b.iter() {
                while let Some(found) = a.find_by_topology_id(id.topology()) {
                    a.remove(found);
                }
            }
        }
        (TopologyType::Polygroup, CombineMode::Intersection) => {
            let drop: Vec<SelectionId> = a
                .iter()
                .filter(|id| b.find_by_topology_id(id.topology()).is_none())
                .collect();
            for id in drop {
                a.remove(id);
            }
        }
    }
    Ok(())
}
