pub mod idgen;
