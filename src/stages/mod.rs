mod icosahedron;

pub use icosahedron::IcosahedronLatticeStage;
