pub mod duels_sea;
pub mod rounds_sea;
