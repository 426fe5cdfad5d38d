/// Read-only access to a row-major single-channel plane.
pub trait ImageView {
    type Pixel: Copy;

    fn width(&self) -> usize;
    fn height(&self) -> usize;
    fn stride(&self) -> usize;

    fn row(&self, y: usize) -> &[Self::Pixel];

    fn rows(&self) -> Rows<'_, Self>
    where
        Self: Sized,
    {
        Rows { image: self, y: 0 }
    }

    #[inline]
    fn dimensions(&self) -> (usize, usize) {
        (self.width(), self.height())
    }

    fn is_contiguous(&self) -> bool {
        self.stride() == self.width()
    }

    /// Whole plane as one slice when rows are tightly packed.
    fn as_slice(&self) -> Option<&[Self::Pixel]> {
        None
    }
}

pub struct Rows<'a, I: ?Sized + ImageView> {
    image: &'a I,
    y: usize,
}

impl<'a, I: ImageView> Iterator for Rows<'a, I> {
    type Item = &'a [I::Pixel];

    fn next(&mut self) -> Option<Self::Item> {
        if self.y >= self.image.height() {
            return None;
        }
        let y = self.y;
        self.y += 1;
        Some(self.image.row(y))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.image.height().saturating_sub(self.y);
        (left, Some(left))
    }
}

impl<'a, I: ImageView> ExactSizeIterator for Rows<'a, I> {}
