// Domain layer - map entities, geodesy and elevation profiles
pub mod entities;
pub mod geodesy;
pub mod line_graph;
pub mod profile;
pub mod shape;
