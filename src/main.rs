//! # photo-copier CLI
//!
//! Files photos into a date-based directory tree.
//!
//! ## Usage
//! ```bash
//! photo-copier copy --src /Volumes/CARD/DCIM --dst ~/Pictures
//! photo-copier resize --src ~/Pictures/2022 --dst ./previews --width 800
//! ```

mod cli;

use photo_copier::Result;

fn main() -> Result<()> {
    cli::run()
}
