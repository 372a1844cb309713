pub mod propagate;
pub mod run;
pub mod sort;
pub mod validate;
