pub mod calculator;
pub mod tensor;

pub use calculator::{derive_table, DerivedRow, DerivedTable, Summary};
pub use tensor::{PrincipalValues, SymmetricTensor, TensorKind};
