pub mod beadnet;
