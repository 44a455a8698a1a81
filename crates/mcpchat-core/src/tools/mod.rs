//! Capability registry
//!
//! ```text
//! ┌──────────────┐   register()    ┌─────────────────────────────┐
//! │ ToolProvider │ ──────────────▶ │ ToolRegistry                │
//! │ (per server) │                 │  name -> (Tool, provider)   │
//! └──────────────┘ ◀────────────── │  catalog() / resolve()      │
//!        ▲           call_tool()   └─────────────────────────────┘
//!        │                                     ▲
//!        └──── execute_tool_call() ────────────┘ ChatSession
//! ```

mod registry;

pub use registry::{ToolError, ToolFilter, ToolRegistry};
