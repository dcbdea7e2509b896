//! Table formatting for retrieval results and cluster reports.

use comfy_table::{
    Attribute, Cell, CellAlignment, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL,
};

use crate::clustering::ClusterInfo;

/// Builder for creating formatted tables.
pub struct TableBuilder {
    table: Table,
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TableBuilder {
    pub fn new() -> Self {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.apply_modifier(UTF8_ROUND_CORNERS);
        Self { table }
    }

    /// Set bold table headers.
    pub fn set_headers(mut self, headers: Vec<&str>) -> Self {
        let header_cells: Vec<Cell> = headers
            .into_iter()
            .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
            .collect();
        self.table.set_header(header_cells);
        self
    }

    pub fn add_row(mut self, row: Vec<Cell>) -> Self {
        self.table.add_row(row);
        self
    }

    pub fn build(self) -> String {
        self.table.to_string()
    }
}

/// Cell color for distances, matching the theme's number style.
const NUMBER_COLOR: Color = Color::Cyan;

/// Ranked retrieval results, closest first.
pub fn create_results_table(results: &[(f64, String)]) -> String {
    results
        .iter()
        .enumerate()
        .fold(
            TableBuilder::new().set_headers(vec!["Rank", "Distance", "Document"]),
            |builder, (rank, (distance, document))| {
                builder.add_row(vec![
                    Cell::new(rank + 1).set_alignment(CellAlignment::Right),
                    Cell::new(format!("{distance:.4}"))
                        .fg(NUMBER_COLOR)
                        .set_alignment(CellAlignment::Right),
                    Cell::new(document),
                ])
            },
        )
        .build()
}

/// Example documents of each cluster, one row per cluster.
pub fn create_cluster_table(clusters: &[ClusterInfo]) -> String {
    clusters
        .iter()
        .fold(
            TableBuilder::new().set_headers(vec!["Cluster", "Examples"]),
            |builder, cluster| {
                builder.add_row(vec![
                    Cell::new(cluster.cluster_id).set_alignment(CellAlignment::Right),
                    Cell::new(cluster.documents.join("\n")),
                ])
            },
        )
        .build()
}
