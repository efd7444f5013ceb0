use clap::Subcommand;

/// Catalog store queries.
#[derive(Clone, Debug, Subcommand)]
pub enum CatalogCommands {
    /// Row counts for sources, images and observations.
    Stats,
    /// Every observation of one source, in time order.
    Lightcurve {
        /// Source ID (`src-...`).
        source_id: String,
    },
}
