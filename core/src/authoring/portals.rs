use alloc::vec::Vec;
use hashbrown::HashSet;

use crate::*;

/// Editor click with the teleport tool for portal `id`.
///
/// Creates the portal on first use, unsets an endpoint that is clicked again,
/// otherwise fills the free endpoint (or replaces `a` when both are set). A
/// portal with no endpoint left is removed.
pub fn toggle_teleport_portal(definition: &mut PuzzleDefinition, pos: GridPosition, id: PortalId) {
    let Some(index) = definition.portals.iter().position(|portal| portal.id == id) else {
        definition.portals.push(TeleportPortal {
            id,
            a: Some(pos),
            b: None,
        });
        log::debug!("Created portal {id} at {pos}");
        return;
    };

    let portal = &mut definition.portals[index];
    if !portal.clear(pos) {
        if portal.a.is_none() {
            portal.a = Some(pos);
        } else if portal.b.is_none() {
            portal.b = Some(pos);
        } else {
            portal.a = Some(pos);
        }
    }

    if portal.is_empty() {
        definition.portals.remove(index);
        log::debug!("Removed portal {id}");
    }
}

/// Fills unset endpoints with free cells in row-major order, each cell used
/// once. Portals that cannot be completed are discarded.
pub fn auto_complete_teleport_pairs(definition: &mut PuzzleDefinition) {
    let occupied: HashSet<GridPosition> = definition
        .portals
        .iter()
        .flat_map(TeleportPortal::endpoints)
        .collect();
    let mut free = definition
        .size
        .positions()
        .filter(|&pos| {
            definition.classify_cell(pos) == CellKind::Empty && !occupied.contains(&pos)
        })
        .collect::<Vec<_>>()
        .into_iter();

    definition.portals.retain_mut(|portal| {
        let needed = usize::from(portal.a.is_none()) + usize::from(portal.b.is_none());
        if needed == 0 {
            return true;
        }
        if free.len() < needed {
            log::debug!("No free cell to complete portal {}, discarding", portal.id);
            return false;
        }
        if portal.a.is_none() {
            portal.a = free.next();
        }
        if portal.b.is_none() {
            portal.b = free.next();
        }
        true
    });
}

/// Unsets `pos` wherever it is a portal endpoint.
pub fn remove_from_all_teleport_portals(definition: &mut PuzzleDefinition, pos: GridPosition) {
    definition.portals.retain_mut(|portal| {
        portal.clear(pos);
        !portal.is_empty()
    });
}

pub fn clear_teleport_portals(definition: &mut PuzzleDefinition) {
    definition.portals.clear();
}
