pub mod playlist;
pub mod update;
pub mod registry;
