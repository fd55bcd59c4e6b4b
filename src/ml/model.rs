// ============================================================
// Layer 5 — Genre Classifier Network
// ============================================================
// A small strided CNN over piano rolls:
//
//   [N, c, pitch, time]
//     conv 3x3 /2 → relu      [N, f,  ., .]
//     conv 3x3 /2 → relu      [N, 2f, ., .]
//     conv 3x3 /2 → relu      [N, 4f, ., .]
//     adaptive avg pool 1x1   [N, 4f]
//     dropout → linear        [N, 2]
//     softmax                 [N, 2]   ← probabilities
//
// The output already sums to one per row, so the training loss
// (BCE) is applied to it directly.

use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig},
        Dropout, DropoutConfig, Linear, LinearConfig, PaddingConfig2d,
    },
    prelude::*,
    tensor::activation::{relu, softmax},
};

#[derive(Config, Debug)]
pub struct GenreClassifierConfig {
    pub channels: usize,
    #[config(default = 16)]
    pub base_filters: usize,
    #[config(default = 0.25)]
    pub dropout: f64,
}

impl GenreClassifierConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> GenreClassifier<B> {
        let f = self.base_filters;
        GenreClassifier {
            conv1:   Self::down_conv(self.channels, f, device),
            conv2:   Self::down_conv(f, 2 * f, device),
            conv3:   Self::down_conv(2 * f, 4 * f, device),
            pool:    AdaptiveAvgPool2dConfig::new([1, 1]).init(),
            dropout: DropoutConfig::new(self.dropout).init(),
            head:    LinearConfig::new(4 * f, 2).init(device),
        }
    }

    // 3x3 stride 2 with padding 1 halves pitch and time (rounding up).
    fn down_conv<B: Backend>(input: usize, output: usize, device: &B::Device) -> Conv2d<B> {
        Conv2dConfig::new([input, output], [3, 3])
            .with_stride([2, 2])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .init(device)
    }
}

#[derive(Module, Debug)]
pub struct GenreClassifier<B: Backend> {
    pub conv1:   Conv2d<B>,
    pub conv2:   Conv2d<B>,
    pub conv3:   Conv2d<B>,
    pub pool:    AdaptiveAvgPool2d,
    pub dropout: Dropout,
    pub head:    Linear<B>,
}

impl<B: Backend> GenreClassifier<B> {
    /// rolls: [batch, c, pitch, time] → class probabilities [batch, 2]
    pub fn forward(&self, rolls: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = relu(self.conv1.forward(rolls));
        let x = relu(self.conv2.forward(x));
        let x = relu(self.conv3.forward(x));

        let x = self.pool.forward(x);
        let [batch, features, _, _] = x.dims();
        let x = self.dropout.forward(x.reshape([batch, features]));

        softmax(self.head.forward(x), 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{ndarray::NdArrayDevice, NdArray};

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_output_is_row_stochastic() {
        let device = NdArrayDevice::Cpu;
        let model: GenreClassifier<TestBackend> =
            GenreClassifierConfig::new(1).with_base_filters(4).init(&device);

        let rolls = Tensor::<TestBackend, 4>::ones([3, 1, 8, 12], &device);
        let probs = model.forward(rolls);
        assert_eq!(probs.dims(), [3, 2]);

        let values = probs.into_data().to_vec::<f32>().unwrap();
        for row in values.chunks(2) {
            assert!(row.iter().all(|&p| (0.0..=1.0).contains(&p)));
            assert!((row[0] + row[1] - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_handles_tiny_inputs() {
        let device = NdArrayDevice::Cpu;
        let model: GenreClassifier<TestBackend> =
            GenreClassifierConfig::new(2).with_base_filters(2).init(&device);

        let rolls = Tensor::<TestBackend, 4>::zeros([1, 2, 1, 1], &device);
        assert_eq!(model.forward(rolls).dims(), [1, 2]);
    }

    #[test]
    fn test_parameter_count() {
        let device = NdArrayDevice::Cpu;
        let model: GenreClassifier<TestBackend> =
            GenreClassifierConfig::new(1).with_base_filters(4).init(&device);

        // conv1 1→4, conv2 4→8, conv3 8→16 (3x3 + bias), head 16→2
        let expected = (1 * 4 * 9 + 4) + (4 * 8 * 9 + 8) + (8 * 16 * 9 + 16) + (16 * 2 + 2);
        assert_eq!(model.num_params(), expected);
    }
}
