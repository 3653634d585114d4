//! Fixed screen row assignment for monitored entities.
//!
//! The layout is computed once at startup and never changes: each entity
//! owns a fixed block of rows below the header for the whole session.

use pipewatch_core::error::{Result, WatchError};

/// Rows reserved per entity: name, status/step, commit, two error lines,
/// and one blank separator. Most entities use only the first three.
pub const LINES_PER_ENTITY: u16 = 6;

/// Rows reserved for the header block: the timestamp line and one blank row.
pub const HEADER_ROWS: u16 = 2;

/// The fixed terminal row range reserved for one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutSlot {
    /// First (0-based) terminal row of the slot
    pub row: u16,
    /// Number of rows reserved
    pub lines: u16,
}

/// Screen layout: slots in entity order plus the reserved rows around them.
#[derive(Debug, Clone)]
pub struct Layout {
    slots: Vec<(String, LayoutSlot)>,
    lines_per_entity: u16,
    header_rows: u16,
}

impl Layout {
    /// Assign a slot to each entity name, in order, starting immediately
    /// after the header block. The i-th entity starts at row
    /// `header_rows + i * lines_per_entity`.
    ///
    /// Fails only when `entity_names` is empty; the caller must not enter
    /// the poll loop in that case.
    pub fn plan(entity_names: &[String], lines_per_entity: u16, header_rows: u16) -> Result<Self> {
        if entity_names.is_empty() {
            return Err(WatchError::config_validation(
                "cannot lay out an empty entity list",
            ));
        }

        let slots = entity_names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                (
                    name.clone(),
                    LayoutSlot {
                        row: header_rows + i as u16 * lines_per_entity,
                        lines: lines_per_entity,
                    },
                )
            })
            .collect();

        Ok(Self {
            slots,
            lines_per_entity,
            header_rows,
        })
    }

    /// Look up an entity's slot by name.
    pub fn slot(&self, name: &str) -> Option<LayoutSlot> {
        self.slots
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, slot)| *slot)
    }

    /// Entity names in layout order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|(n, _)| n.as_str())
    }

    pub fn lines_per_entity(&self) -> u16 {
        self.lines_per_entity
    }

    pub fn header_rows(&self) -> u16 {
        self.header_rows
    }

    /// First row below all entity slots, reserved for transient loop errors.
    pub fn transient_error_row(&self) -> u16 {
        self.header_rows + self.slots.len() as u16 * self.lines_per_entity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("entity-{i}")).collect()
    }

    #[test]
    fn test_rows_follow_header_and_stride() {
        let layout = Layout::plan(&names(3), 6, 2).unwrap();
        assert_eq!(layout.slot("entity-0").unwrap().row, 2);
        assert_eq!(layout.slot("entity-1").unwrap().row, 8);
        assert_eq!(layout.slot("entity-2").unwrap().row, 14);
    }

    #[test]
    fn test_slots_are_pairwise_disjoint() {
        let layout = Layout::plan(&names(8), 6, 2).unwrap();
        let slots: Vec<LayoutSlot> = layout.names().map(|n| layout.slot(n).unwrap()).collect();

        for (i, a) in slots.iter().enumerate() {
            for b in slots.iter().skip(i + 1) {
                let a_end = a.row + a.lines;
                let b_end = b.row + b.lines;
                assert!(
                    a_end <= b.row || b_end <= a.row,
                    "slots overlap: {a:?} vs {b:?}"
                );
            }
        }
    }

    #[test]
    fn test_empty_entity_list_is_an_error() {
        let err = Layout::plan(&[], 6, 2).unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_transient_error_row_below_all_slots() {
        let layout = Layout::plan(&names(2), 6, 2).unwrap();
        assert_eq!(layout.transient_error_row(), 14);

        let last = layout.slot("entity-1").unwrap();
        assert!(layout.transient_error_row() >= last.row + last.lines);
    }

    #[test]
    fn test_unknown_name_has_no_slot() {
        let layout = Layout::plan(&names(1), 6, 2).unwrap();
        assert!(layout.slot("missing").is_none());
    }
}
