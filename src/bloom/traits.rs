pub trait BloomFilterStats {
    fn capacity(&self) -> usize;
    fn false_positive_rate(&self) -> f64;
    fn insert_count(&self) -> usize;
}
