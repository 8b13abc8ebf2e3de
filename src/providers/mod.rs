pub mod bankersalgo;
