pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    let mut sum = 0.0;
    for i in 0..a.len() {
        sum += a[i] * b[i];
    }
    sum
}

pub fn l2_norm(v: &[f32]) -> f32 {
    dot(v, v).sqrt()
}
