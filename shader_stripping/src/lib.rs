/*!
# Shader Stripping

Shader variant harvesting and build-time variant stripping.

Two subsystems share one data type, the persisted variant collection:

- **Harvester**: stages every material of a set of shaders in an isolated
  context, waits for the host's live variant registry to settle, and rebuilds
  a destination collection from it.
- **Strip-decision engine**: a build-time preprocessing hook that removes the
  candidate variants no stripping pass wants to keep.

The host engine (asset store, staging, live registry, compile hook) is reached
only through the traits in `host`; `host::memory` is a complete in-memory host.

## Architecture

- **VariantCollection**: named, grouped, duplicate-free set of variants
- **Harvester**: harvesting protocol driving a `QuiescencePoll`
- **ShaderStrippingPass**: one keep/strip rule over collections
- **ShaderVariantPreprocessor**: applies every discovered stripping settings asset
*/

// Internal modules
mod error;
mod diagnostics;
pub mod log;
pub mod variant;
pub mod host;
pub mod harvest;
pub mod strip;

// Main stripping namespace module
pub mod stripping {
    // Error types
    pub use crate::error::{Error, Result};

    // Process-wide logger
    pub use crate::diagnostics::Diagnostics;

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger, FilteredLogger, format_entry};
    }

    // Variant data model
    pub mod variant {
        pub use crate::variant::*;
    }

    // Host capabilities
    pub mod host {
        pub use crate::host::*;
    }

    // Harvesting
    pub mod harvest {
        pub use crate::harvest::*;
    }

    // Strip-decision engine
    pub mod strip {
        pub use crate::strip::*;
    }
}
