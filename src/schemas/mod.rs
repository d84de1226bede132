pub mod answer;
pub mod attempt;
pub mod exam;
pub mod group;
pub mod result;
