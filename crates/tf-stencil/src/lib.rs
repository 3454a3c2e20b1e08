//! tf-stencil: the degree-of-freedom layout and the flat stencil-tensor
//! container used to assemble per-cell linear operators before they are
//! folded into a sparse matrix.

pub mod layout;
pub mod tensor;

pub use layout::VariableLayout;
pub use tensor::{Index8, Sel, StencilTensor};
