pub mod pre;
