// Public library interface so the debug binaries can use the core modules.

pub mod chart;
pub mod geom;
pub mod layout;
pub mod scanner;
pub mod tree;
