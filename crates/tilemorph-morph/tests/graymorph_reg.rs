//! Gray morphology regression test
//!
//! Tests:
//!   (1) Tiled dilation and erosion against a direct per-pixel computation,
//!       across tile boundaries and with an off-center SEL
//!   (2) Duality of erosion and dilation
//!   (3) Idempotence of opening and closing
//!   (4) Composite operations: tophat, bottom-hat and gradient
//!
//! Run with:
//! ```
//! cargo test -p tilemorph-morph --test graymorph_reg
//! ```

use tilemorph_core::FPix;
use tilemorph_morph::{
    Sel, bottom_hat_gray, close_gray, dilate_gray, erode_gray, gradient_gray, open_gray,
    top_hat_gray,
};
use tilemorph_test::{RegParams, random_fpix};

/// Direct flat stencil: pixels outside the image are skipped
fn naive_pass(src: &FPix, sel: &Sel, dilate: bool) -> FPix {
    let offsets: Vec<(i32, i32)> = sel.hit_offsets().collect();
    let (w, h) = (src.width() as i32, src.height() as i32);
    let mut out = src.create_template();
    for y in 0..h {
        for x in 0..w {
            let mut acc: Option<f32> = None;
            for &(dx, dy) in &offsets {
                let (nx, ny) = (x + dx, y + dy);
                if nx < 0 || ny < 0 || nx >= w || ny >= h {
                    continue;
                }
                let v = src.get_pixel_unchecked(nx as u32, ny as u32);
                acc = Some(match acc {
                    None => v,
                    Some(a) if dilate => a.max(v),
                    Some(a) => a.min(v),
                });
            }
            let fallback = if dilate { -f32::MAX } else { f32::MAX };
            out.set_pixel_unchecked(x as u32, y as u32, acc.unwrap_or(fallback));
        }
    }
    out
}

fn invert(pix: &FPix) -> FPix {
    pix.map(|v| 255.0 - v)
}

#[test]
fn graymorph_reg_stencil() {
    let mut rp = RegParams::new("graymorph_stencil");

    // 70x45 spans three tile columns and two tile rows
    let pixs = random_fpix(70, 45, 256, 11).unwrap();
    let brick = Sel::create_brick(5, 3).unwrap();
    let skew = Sel::from_string("xx.\n.xx\n..x", 0, 0).unwrap();

    for sel in [&brick, &skew] {
        let d = dilate_gray(&pixs, sel, 1).unwrap();
        rp.compare_fpix(&naive_pass(&pixs, sel, true), &d);

        let e = erode_gray(&pixs, sel, 1).unwrap();
        rp.compare_fpix(&naive_pass(&pixs, sel, false), &e);

        // Two iterations are two passes
        let d2 = dilate_gray(&pixs, sel, 2).unwrap();
        rp.compare_fpix(&dilate_gray(&d, sel, 1).unwrap(), &d2);
    }

    rp.compare_values(1.0, if dilate_gray(&pixs, &brick, 0).is_err() { 1.0 } else { 0.0 }, 0.0);

    assert!(rp.cleanup(), "graymorph_reg stencil tests failed");
}

#[test]
fn graymorph_reg_duality() {
    let mut rp = RegParams::new("graymorph_duality");

    let pixs = random_fpix(40, 40, 256, 12).unwrap();
    let sel = Sel::create_brick(7, 3).unwrap();
    let inv = invert(&pixs);

    // erode(f) == 255 - dilate(255 - f)
    let e = erode_gray(&pixs, &sel, 1).unwrap();
    rp.compare_fpix(&e, &invert(&dilate_gray(&inv, &sel, 1).unwrap()));

    // open(f) == 255 - close(255 - f)
    let o = open_gray(&pixs, &sel, 1).unwrap();
    rp.compare_fpix(&o, &invert(&close_gray(&inv, &sel, 1).unwrap()));

    // tophat(f) == bottom_hat(255 - f)
    let t = top_hat_gray(&pixs, &sel, 1).unwrap();
    rp.compare_fpix(&t, &bottom_hat_gray(&inv, &sel, 1).unwrap());

    assert!(rp.cleanup(), "graymorph_reg duality tests failed");
}

#[test]
fn graymorph_reg_idempotence() {
    let mut rp = RegParams::new("graymorph_idempotence");

    let pixs = random_fpix(50, 35, 256, 13).unwrap();
    let sel = Sel::create_square(3).unwrap();

    let o = open_gray(&pixs, &sel, 1).unwrap();
    rp.compare_fpix(&o, &open_gray(&o, &sel, 1).unwrap());

    let c = close_gray(&pixs, &sel, 1).unwrap();
    rp.compare_fpix(&c, &close_gray(&c, &sel, 1).unwrap());

    // open <= f <= close
    let ordered = o
        .data()
        .iter()
        .zip(pixs.data().iter().zip(c.data()))
        .all(|(&lo, (&f, &hi))| lo <= f && f <= hi);
    rp.compare_values(1.0, if ordered { 1.0 } else { 0.0 }, 0.0);

    assert!(rp.cleanup(), "graymorph_reg idempotence tests failed");
}

#[test]
fn graymorph_reg_composite() {
    let mut rp = RegParams::new("graymorph_composite");

    let pixs = random_fpix(33, 33, 256, 14).unwrap();
    let sel = Sel::create_square(5).unwrap();

    let t = top_hat_gray(&pixs, &sel, 1).unwrap();
    rp.compare_fpix(&pixs.sub(&open_gray(&pixs, &sel, 1).unwrap()).unwrap(), &t);
    rp.compare_values(1.0, if t.min_value().unwrap() >= 0.0 { 1.0 } else { 0.0 }, 0.0);

    let b = bottom_hat_gray(&pixs, &sel, 1).unwrap();
    rp.compare_values(1.0, if b.min_value().unwrap() >= 0.0 { 1.0 } else { 0.0 }, 0.0);

    let g = gradient_gray(&pixs, &sel).unwrap();
    let expected = dilate_gray(&pixs, &sel, 1)
        .unwrap()
        .sub(&erode_gray(&pixs, &sel, 1).unwrap())
        .unwrap();
    rp.compare_fpix(&expected, &g);

    // A flat image has no gradient
    let flat = FPix::new_with_value(20, 20, 9.0).unwrap();
    rp.compare_values(0.0, gradient_gray(&flat, &sel).unwrap().sum() as f64, 0.0);

    assert!(rp.cleanup(), "graymorph_reg composite tests failed");
}
