mod entry;
mod system;

use pacer::error::AppResult;

fn main() -> AppResult<()> {
    entry::run()
}
