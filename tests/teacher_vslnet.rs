use burn::backend::{Autodiff, NdArray};
use burn::lr_scheduler::LrScheduler;
use burn::optim::{GradientsParams, Optimizer};
use burn::prelude::*;
use burn::tensor::Distribution;
use vslnet_cbkd::prelude::*;

type B = NdArray;
type AB = Autodiff<NdArray>;

const BATCH: usize = 2;
const CLIPS: usize = 6;
const VIDEO_DIM: usize = 12;
const DIM: usize = 8;

fn config() -> TeacherVslNetConfig {
    TeacherVslNetConfig::new(20, 30)
        .with_video_feature_dim(VIDEO_DIM)
        .with_dim(DIM)
        .with_num_heads(2)
        .with_word_dim(6)
        .with_char_dim(4)
        .with_max_pos_len(16)
        .with_drop_rate(0.1)
}

struct Batch<B: Backend> {
    word_ids: Tensor<B, 2, Int>,
    char_ids: Tensor<B, 3, Int>,
    video: Tensor<B, 3>,
    v_mask: Tensor<B, 2, Bool>,
    q_mask: Tensor<B, 2, Bool>,
    start_labels: Tensor<B, 1, Int>,
    end_labels: Tensor<B, 1, Int>,
    highlight_labels: Tensor<B, 2>,
}

fn batch<B: Backend>(device: &B::Device) -> Batch<B> {
    let word_ids = Tensor::from_ints([[2, 5, 7, 3], [4, 9, 0, 0]], device);
    let char_ids = Tensor::from_ints(
        [
            [
                [3, 4, 0, 0, 0],
                [5, 6, 7, 0, 0],
                [8, 9, 10, 11, 12],
                [13, 0, 0, 0, 0],
            ],
            [
                [14, 15, 16, 0, 0],
                [17, 18, 0, 0, 0],
                [0, 0, 0, 0, 0],
                [0, 0, 0, 0, 0],
            ],
        ],
        device,
    );
    let video = Tensor::random([BATCH, CLIPS, VIDEO_DIM], Distribution::Default, device);
    let v_mask = Tensor::<B, 2, Int>::from_ints([[1, 1, 1, 1, 1, 1], [1, 1, 1, 1, 0, 0]], device)
        .bool();
    let q_mask = word_ids.clone().not_equal_elem(0);

    Batch {
        word_ids,
        char_ids,
        video,
        v_mask,
        q_mask,
        start_labels: Tensor::from_ints([1, 0], device),
        end_labels: Tensor::from_ints([4, 2], device),
        highlight_labels: Tensor::from_floats(
            [[0.0, 1.0, 1.0, 1.0, 1.0, 0.0], [1.0, 1.0, 1.0, 0.0, 0.0, 0.0]],
            device,
        ),
    }
}

fn forward<B: Backend>(model: &TeacherVslNet<B>, batch: &Batch<B>) -> VslNetOutput<B> {
    model.forward(
        batch.word_ids.clone(),
        batch.char_ids.clone(),
        batch.video.clone(),
        batch.v_mask.clone(),
        batch.q_mask.clone(),
    )
}

fn total_loss<B: Backend>(
    model: &TeacherVslNet<B>,
    batch: &Batch<B>,
    output: VslNetOutput<B>,
) -> Tensor<B, 1> {
    let span = model.compute_loss(
        output.start_logits,
        output.end_logits,
        batch.start_labels.clone(),
        batch.end_labels.clone(),
    );
    let highlight = model.compute_highlight_loss(
        output.h_score,
        batch.highlight_labels.clone(),
        batch.v_mask.clone(),
    );
    span + highlight * 5.0
}

#[test]
fn forward_shapes_for_every_variant() {
    let device = Default::default();
    let batch = batch::<B>(&device);

    for predictor in [Predictor::Rnn, Predictor::Transformer] {
        for film_mode in [FilmMode::Disabled, FilmMode::Pre, FilmMode::Post] {
            let model = config()
                .with_predictor(predictor)
                .with_film_mode(film_mode)
                .init::<B>(None, &device)
                .unwrap();

            let output = forward(&model, &batch);
            assert_eq!(output.h_score.dims(), [BATCH, CLIPS]);
            assert_eq!(output.start_logits.dims(), [BATCH, CLIPS]);
            assert_eq!(output.end_logits.dims(), [BATCH, CLIPS]);

            let loss = total_loss(&model, &batch, output).into_scalar();
            assert!(loss.is_finite(), "{predictor:?} {film_mode:?}: {loss}");
        }
    }
}

#[test]
fn padded_clips_are_never_highlighted_nor_selected() {
    let device = Default::default();
    let batch = batch::<B>(&device);
    let model = config().init::<B>(None, &device).unwrap();

    let output = forward(&model, &batch);
    let h_score = output.h_score.into_data().to_vec::<f32>().unwrap();
    assert_eq!(h_score[CLIPS + 4], 0.0);
    assert_eq!(h_score[CLIPS + 5], 0.0);
    assert!(h_score[..CLIPS + 4].iter().all(|s| *s > 0.0 && *s < 1.0));

    let (start, end) = model.extract_index(output.start_logits, output.end_logits);
    let start = start.into_data().convert::<i64>().to_vec::<i64>().unwrap();
    let end = end.into_data().convert::<i64>().to_vec::<i64>().unwrap();
    for (s, e) in start.iter().zip(&end) {
        assert!(s <= e);
    }
    assert!(start[1] < 4 && end[1] < 4);
}

#[test]
fn inference_is_deterministic_without_autodiff() {
    let device = Default::default();
    let batch = batch::<B>(&device);
    let model = config().init::<B>(None, &device).unwrap();

    let a = forward(&model, &batch).start_logits;
    let b = forward(&model, &batch).start_logits;
    assert!((a - b).abs().max().into_scalar() == 0.0);
}

#[test]
fn mismatched_word_vectors_are_rejected() {
    let device = Default::default();
    let vectors = Tensor::<B, 2>::zeros([18, 7], &device);
    let err = config().init::<B>(Some(vectors), &device).unwrap_err();
    assert!(matches!(err, VslNetError::WordVectorDim { expected: 6, actual: 7 }));
}

#[test]
fn one_training_step_updates_weights_but_not_frozen_vectors() {
    let device = Default::default();
    let batch = batch::<AB>(&device);
    let vectors = Tensor::<AB, 2>::random([18, 6], Distribution::Default, &device);
    let model = config().init::<AB>(Some(vectors.clone()), &device).unwrap();

    let output = forward(&model, &batch);
    let loss = total_loss(&model, &batch, output);
    let grads = GradientsParams::from_grads(loss.backward(), &model);

    let (mut optim, mut scheduler) =
        build_optimizer_and_scheduler::<AB, TeacherVslNet<AB>>(&OptimizerConfig::new(10)).unwrap();
    let lr = scheduler.step();
    assert!(lr > 0.0);
    let updated = optim.step(lr, model.clone(), grads);

    let before = model.video_affine.projection.weight.val();
    let after = updated.video_affine.projection.weight.val();
    assert!((before - after).abs().max().into_scalar() > 0.0);

    let WordTable::Pretrained(words) = &updated.embedding_net.word.table else {
        panic!("expected pre-trained word vectors");
    };
    let diff = (words.vectors.val() - vectors).abs().max().into_scalar();
    assert_eq!(diff, 0.0);
    assert_eq!(words.pad.val().abs().sum().into_scalar(), 0.0);
}

#[test]
fn weight_decay_skips_biases_and_layer_norms() {
    let device = Default::default();
    let model = config().init::<B>(None, &device).unwrap();
    let groups = param_groups::<B, _>(&model);

    let attention = &model.feature_encoder.attention_block;
    for id in [
        attention.norm_attention.gamma.id,
        attention.norm_attention.beta.id,
        attention.query.bias.as_ref().unwrap().id,
        model.video_affine.projection.bias.as_ref().unwrap().id,
    ] {
        assert!(groups.no_decay.contains(&id));
        assert!(!groups.decay.contains(&id));
    }
    for id in [
        attention.query.weight.id,
        model.cq_attention.w_context.id,
        model.cq_attention.w_mul.id,
        model.feature_encoder.positional.embedding.weight.id,
    ] {
        assert!(groups.decay.contains(&id));
    }
}
