use divan::Bencher;
use simbio::reactions::single::Conversion;
use simbio::{
    amount, parameter, reaction_amount, volume, Binding, CompileOptions, CompiledModel, Model,
    SystemBuilder,
};

fn main() {
    divan::main();
}

/// A compartment with a linear chain of `n` conversions.
fn chain(n: usize) -> Model {
    let mut b = SystemBuilder::compartment("Chain");
    b.variable("V", volume(1.0)).unwrap();
    let k = b.parameter("k", parameter(1.0)).unwrap();
    let species: Vec<_> = (0..=n)
        .map(|i| b.reactant(&format!("x{}", i), reaction_amount(1.0)).unwrap())
        .collect();
    for i in 0..n {
        b.reaction(&format!("r{}", i), Conversion::new(species[i], species[i + 1], k))
            .unwrap();
    }
    b.build().unwrap()
}

fn setup(n: usize) -> Model {
    let template = chain(n);
    let mut b = SystemBuilder::compartment("Outer");
    b.variable("V", volume(2.0)).unwrap();
    b.variable("A", amount(1.0)).unwrap();
    for i in 0..10 {
        b.instantiate(&format!("c{}", i), &template, &[("k", Binding::from(0.5))])
            .unwrap();
    }
    b.build().unwrap()
}

#[divan::bench(consts = [1, 10, 100])]
fn instantiate<const N: usize>(bencher: Bencher) {
    let template = chain(N);
    bencher.bench_local(|| {
        let mut b = SystemBuilder::system("Outer");
        b.instantiate("chain", &template, &[]).unwrap();
        b.build().unwrap()
    });
}

#[divan::bench(consts = [1, 10, 100])]
fn equations<const N: usize>(bencher: Bencher) {
    let model = setup(N);
    bencher.bench_local(|| model.equations().unwrap());
}

#[divan::bench(consts = [1, 10, 100])]
fn rhs<const N: usize>(bencher: Bencher) {
    let model = setup(N);
    let compiled = CompiledModel::build(&model, &CompileOptions::new()).unwrap();
    let y = compiled.initial_state().unwrap();
    bencher.bench_local(|| compiled.rhs(0.0, &y).unwrap());
}
