mod gpu;
mod logging;
mod runtime;
mod tracer;

use anyhow::Result;

use crate::runtime::{Runtime, ViewerConfig};

fn main() -> Result<()> {
    logging::init(None);

    Runtime::run(ViewerConfig::default())
}
