/// Something computed from a whole input, typically a global descriptor of a
/// point cloud. Unlike a filter, the output shares no structure with the input.
pub trait Feature<I: ?Sized, O> {
    fn compute(&self, input: &I) -> O;
}
