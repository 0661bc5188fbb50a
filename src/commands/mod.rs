// Command handlers module
pub mod lookup;
pub mod run;
