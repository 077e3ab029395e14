pub mod coingate;
