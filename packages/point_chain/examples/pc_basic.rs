//! Basic usage of the `point_chain` crate:
//!
//! * Creating a buffer.
//! * Appending points.
//! * Inspecting the first/last points.
//! * Removing points from the end.

use point_chain::{Point, PointChain};

fn main() {
    let mut contour = PointChain::<16>::new();

    // Trace a small square. This stays entirely in the inline chunk.
    for (x, y) in [(0, 0), (100, 0), (100, 100), (0, 100)] {
        contour
            .push(Point::new(x, y))
            .expect("allocation cannot fail - the inline chunk has room");
    }

    println!(
        "Contour holds {} points with capacity for {}",
        contour.len(),
        contour.capacity()
    );

    // The accessors are transient views - valid until the next mutation.
    println!("First point: {:?}", contour.first());
    println!("Last point: {:?}", contour.last());

    // A long path spills into heap chunks, doubling in capacity each time.
    for i in 0..1000 {
        contour
            .push(Point::new(i, i))
            .expect("out of memory while growing the contour");
    }

    println!("After 1004 points: {contour:?}");

    // Backtracking pops points and releases emptied chunks as it goes.
    while contour.len() > 4 {
        _ = contour.pop();
    }

    println!("After backtracking: {contour:?}");
    println!("Last point is again: {:?}", contour.last());
}
