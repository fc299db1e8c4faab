pub use self::{
    machine::{Machine, MachineError},
    predicate::{CharClass, ClassFn, ClassKind, NamedClass, Predicate},
    sim::Simulator,
    traits::Simulate,
};

pub type StateId = usize;

mod dot;
mod machine;
mod predicate;
mod sim;
mod traits;
