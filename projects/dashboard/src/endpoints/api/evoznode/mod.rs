pub mod winners;
